//! Command runners.
//!
//! Each runner resolves its inputs, builds a `Session` and drives it, handing
//! every resulting frame to a presenter.
mod interactive;
mod plan;
mod run;
#[cfg(test)]
mod test_support;

pub use interactive::run_session;
pub use plan::run_plan;
pub use run::run_run;

use crate::catalog::{parse_step_list, Step};
use crate::cli::EngineArgs;
use crate::config::resolve_config;
use crate::engine::HttpEngine;
use crate::presenter::OutputFormat;
use anyhow::{anyhow, Context, Result};

fn output_format(json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    }
}

fn parse_steps(raw: &str) -> Result<Vec<Step>> {
    let steps = parse_step_list(raw)
        .map_err(|err| anyhow!(err))
        .context("parse --steps")?;
    if steps.is_empty() {
        return Err(anyhow!("--steps must name at least one step"));
    }
    Ok(steps)
}

fn connect(args: &EngineArgs) -> Result<HttpEngine> {
    let config = resolve_config(args.config.as_deref(), args.engine_url.as_deref())
        .context("resolve engine config")?;
    Ok(HttpEngine::new(&config))
}
