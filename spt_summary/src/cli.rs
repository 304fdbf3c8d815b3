use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Ensemble forecast summary tables with return period classification.
#[derive(Parser)]
#[command(
    name = "spt-summary",
    version,
    about = "Summarize ensemble streamflow forecasts on a 3-hour grid"
)]
pub struct Cli {
    /// Increase verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to TOML configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the log file from config.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Write the run report as JSON to this path.
    #[arg(long, global = true)]
    pub json_report: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Summarize a single forecast directory.
    Run(RunArgs),
    /// Summarize every `<watershed>/<date>` directory under an output root.
    Batch(BatchArgs),
}

/// Arguments for the `run` subcommand.
#[derive(clap::Args)]
pub struct RunArgs {
    /// Forecast directory holding the ensemble statistics.
    pub forecast_dir: PathBuf,

    /// Watershed name; defaults to the name of the parent directory.
    #[arg(short, long)]
    pub watershed: Option<String>,

    /// Return period JSON file, overriding the configured source.
    #[arg(short, long)]
    pub return_periods: Option<PathBuf>,
}

/// Arguments for the `batch` subcommand.
#[derive(clap::Args)]
pub struct BatchArgs {
    /// Output root laid out as `<root>/<watershed>/<date>/`.
    pub root: PathBuf,

    /// Root of the return period tree (`<root>/<era>/<watershed>/`).
    #[arg(long)]
    pub return_period_root: Option<PathBuf>,

    /// Reanalysis era of the return periods, e.g. `era_5`.
    #[arg(long)]
    pub era: Option<String>,
}
