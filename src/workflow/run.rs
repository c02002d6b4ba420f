//! Scripted run: upload once, then append each step and fetch its result.
use super::{connect, output_format, parse_steps};
use crate::catalog::Step;
use crate::cli::RunArgs;
use crate::engine::Engine;
use crate::orchestrator::request_result_for;
use crate::presenter::{Frame, Presenter, TerminalPresenter};
use crate::session::Session;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;

/// Counts of what happened to each requested step.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct RunSummary {
    shown: usize,
    empty: usize,
    failed: usize,
    blocked: usize,
}

/// Remote failures are reported per step; only upload and config errors fail the run.
pub fn run_run(args: &RunArgs) -> Result<()> {
    let steps = parse_steps(&args.steps)?;
    let engine = connect(&args.engine)?;
    let presenter = TerminalPresenter::new(output_format(args.json));
    let mut session = Session::new();

    let started = Instant::now();
    let summary = drive(&mut session, &engine, &presenter, &args.dataset, &steps)?;
    tracing::info!(
        elapsed_ms = started.elapsed().as_millis(),
        shown = summary.shown,
        empty = summary.empty,
        failed = summary.failed,
        blocked = summary.blocked,
        "run complete"
    );
    Ok(())
}

fn drive(
    session: &mut Session,
    engine: &dyn Engine,
    presenter: &dyn Presenter,
    dataset: &Path,
    steps: &[Step],
) -> Result<RunSummary> {
    session.begin_upload();
    let receipt = match engine.upload(dataset) {
        Ok(receipt) => receipt,
        Err(err) => {
            session.upload_failed();
            presenter.notify(&err.to_string())?;
            return Err(err).with_context(|| format!("upload {}", dataset.display()));
        }
    };
    session.attach_dataset(receipt);
    presenter.present(&Frame::from_session(session))?;

    let mut summary = RunSummary::default();
    for step in steps {
        let Some(index) = session.select_step(*step).index() else {
            continue;
        };
        match request_result_for(session, engine, index) {
            Ok(result) if result.is_empty() => summary.empty += 1,
            Ok(_) => summary.shown += 1,
            Err(err) if err.is_precondition() => {
                summary.blocked += 1;
                tracing::info!(step = %step, index, reason = %err, "result not requested");
            }
            Err(err) => {
                summary.failed += 1;
                presenter.notify(&err.to_string())?;
            }
        }
        presenter.present(&Frame::from_session(session))?;
    }
    Ok(summary)
}
