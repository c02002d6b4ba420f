//! CLI argument parsing for the step sequencer.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "normflow",
    version,
    about = "Sequence data-normalization steps and run them against a remote engine",
    after_help = "Steps: clean, fd, 1nf, 2nf, 3nf, er\n\nExamples:\n  normflow plan --steps clean,3nf,fd\n  normflow run --dataset people.csv --steps clean,fd,1nf\n  normflow session --engine-url http://127.0.0.1:5002",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Log progress to stderr (overridden by NORMFLOW_LOG)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Plan(PlanArgs),
    Run(RunArgs),
    Session(SessionArgs),
}

/// Engine location overrides shared by the commands that talk to the engine.
#[derive(Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// Base URL of the execution engine (overrides config and NORMFLOW_ENGINE_URL)
    #[arg(long, value_name = "URL")]
    pub engine_url: Option<String>,

    /// Engine config file (defaults to the user config dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Classify a step sequence offline")]
pub struct PlanArgs {
    /// Comma separated step identifiers, e.g. clean,fd,1nf
    #[arg(long, value_name = "IDS")]
    pub steps: String,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Upload a dataset and fetch each step's result")]
pub struct RunArgs {
    /// CSV dataset to upload
    #[arg(long, value_name = "PATH")]
    pub dataset: PathBuf,

    /// Comma separated step identifiers, appended in order
    #[arg(long, value_name = "IDS")]
    pub steps: String,

    #[command(flatten)]
    pub engine: EngineArgs,

    /// Emit one JSON frame per line
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Interactive session reading commands from stdin")]
pub struct SessionArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Emit one JSON frame per line
    #[arg(long)]
    pub json: bool,
}
