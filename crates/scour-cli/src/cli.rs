//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "scour",
    version,
    about = "Configurable cleaning pipelines for tabular data",
    long_about = "Run configurable cleaning pipelines over tabular datasets.\n\n\
                  A pipeline is described by a JSON config: a source, an ordered\n\
                  list of transform/validation steps, an executor, and an optional\n\
                  destination and quality report."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a pipeline described by a JSON config file.
    Run(RunArgs),

    /// Generate a deterministic sample dataset for demos and tests.
    Sample(SampleArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Path to the pipeline config file.
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Run the pipeline but skip writing to the destination.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Override the maximum tolerated error rate from the config.
    #[arg(long = "max-error-rate", value_name = "RATE")]
    pub max_error_rate: Option<f64>,
}

#[derive(Parser)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Number of rows to generate.
    #[arg(long, default_value_t = 1000)]
    pub rows: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
