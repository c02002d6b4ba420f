mod advisory;
mod blocking;
mod catalog;
mod cli;
mod config;
mod engine;
mod error;
mod orchestrator;
mod presenter;
mod sequence;
mod session;
mod transitions;
mod util;
mod workflow;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "NORMFLOW_LOG";

fn main() -> Result<()> {
    let args = cli::RootArgs::parse();
    init_tracing(args.verbose);

    match args.command {
        cli::Command::Plan(args) => workflow::run_plan(&args),
        cli::Command::Run(args) => workflow::run_run(&args),
        cli::Command::Session(args) => workflow::run_session(&args),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
