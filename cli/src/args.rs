//! Command-line arguments

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "model-arena",
    version,
    about = "Race one prompt across a panel of language models and score the answers"
)]
pub struct Cli {
    /// The prompt to evaluate against the panel
    pub prompt: String,

    /// Restrict the panel to these backend ids (repeatable)
    #[arg(short, long)]
    pub models: Vec<String>,

    /// Per-attempt timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Retry attempts for transient failures
    #[arg(long)]
    pub retries: Option<u32>,

    /// Explicit config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Ignore config files and use built-in defaults
    #[arg(long)]
    pub no_config: bool,

    /// Suppress progress rendering
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
