//! Offline classification of a step sequence.
use super::{output_format, parse_steps};
use crate::catalog::Step;
use crate::cli::PlanArgs;
use crate::presenter::{Frame, Presenter, TerminalPresenter};
use crate::session::Session;
use anyhow::Result;

pub fn run_plan(args: &PlanArgs) -> Result<()> {
    let steps = parse_steps(&args.steps)?;
    let session = plan_session(&steps);
    let presenter = TerminalPresenter::new(output_format(args.json));
    presenter.present(&Frame::from_session(&session))
}

fn plan_session(steps: &[Step]) -> Session {
    let mut session = Session::new();
    for step in steps {
        if !session.append(*step) {
            tracing::info!(step = %step, "duplicate step ignored");
        }
    }
    session
}
