mod cli;

use std::fs::File;
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use spt_summary::config::{SummaryConfig, load_config};
use spt_summary::logging::init_logger;
use spt_summary::pipeline::{run_batch, run_forecast};
use spt_summary::report::{print_batch_summary, print_summary};

use crate::cli::{Cli, Command};

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SummaryConfig::default(),
    };

    let log_file = cli.log_file.as_deref().or(config.logging.file.as_deref());
    init_logger(config.logging.level.raised_by(cli.verbose), log_file)
        .context("failed to initialize logging")?;

    match cli.command {
        Command::Run(args) => {
            if let Some(path) = args.return_periods {
                config.inputs.return_period_file = Some(path);
            }
            let report = run_forecast(&args.forecast_dir, args.watershed.as_deref(), &config)
                .with_context(|| format!("forecast run {} failed", args.forecast_dir.display()))?;
            print_summary(&report);
            if let Some(path) = &cli.json_report {
                write_json(path, &report)?;
            }
        }
        Command::Batch(args) => {
            if let Some(root) = args.return_period_root {
                config.inputs.return_period_root = Some(root);
            }
            if let Some(era) = args.era {
                config.inputs.era = era;
            }
            let report = run_batch(&args.root, &config)?;
            print_batch_summary(&report);
            if let Some(path) = &cli.json_report {
                write_json(path, &report)?;
            }
            if !report.is_success() {
                anyhow::bail!("{} forecast run(s) failed", report.failures.len());
            }
        }
    }

    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    serde_json::to_writer_pretty(file, value)
        .with_context(|| format!("cannot write report {}", path.display()))?;
    Ok(())
}
