//! Forecast run driver.
//!
//! A forecast run is one directory `<output_root>/<watershed>/<date>/`
//! holding the ensemble statistics of one forecast (`nces.max.nc` and
//! `nces.avg.nc`, or a JSON fallback). Running it reads the
//! statistics and the watershed's return periods, assembles the summary
//! table, and writes it next to the inputs.
//!
//! Runs share nothing, so a batch processes them in parallel and a failing
//! run never stops the others.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, error, info};

use crate::config::SummaryConfig;
use crate::ingest::ensemble::{load_ensemble, load_ensemble_netcdf};
use crate::ingest::return_periods::{
    fetch_return_periods, find_return_period_file, load_return_periods,
};
use crate::logging::log_run_summary;
use crate::model::{EnsembleStats, IngestError, RunError, ThresholdTable};
use crate::output::{summary_file_name, write_csv};
use crate::report::{BatchReport, FailedRun, RunReport};
use crate::summary::assemble;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Run(#[from] RunError),
    #[error("cannot write summary table {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("cannot derive watershed and date from forecast directory {0}")]
    InvalidForecastDir(PathBuf),
    #[error(
        "no return period source: set inputs.return_period_file, inputs.return_period_root or enable the database"
    )]
    NoReturnPeriodSource,
    #[error("environment variable {0} is not set")]
    MissingDatabaseUrl(String),
    #[error("cannot list forecast directories under {path}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Watershed name of a forecast directory: the name of its parent.
pub fn watershed_of(forecast_dir: &Path) -> Option<String> {
    forecast_dir
        .parent()?
        .file_name()?
        .to_str()
        .map(str::to_string)
}

/// Loads the ensemble statistics of a forecast directory: the netCDF
/// statistic files when the maximum file is present, the JSON file otherwise.
pub fn load_forecast_stats(forecast_dir: &Path, config: &SummaryConfig) -> Result<EnsembleStats, IngestError> {
    let inputs = &config.inputs;
    let max_path = forecast_dir.join(&inputs.max_file);
    if max_path.exists() {
        debug!(path = %max_path.display(), "reading netCDF ensemble statistics");
        load_ensemble_netcdf(&max_path, &forecast_dir.join(&inputs.mean_file))
    } else {
        let path = forecast_dir.join(&inputs.ensemble_file);
        debug!(path = %path.display(), "reading JSON ensemble statistics");
        load_ensemble(&path)
    }
}

/// Loads the return period thresholds of a watershed from the configured
/// source: an explicit file, then the database, then the file tree.
pub fn load_thresholds(config: &SummaryConfig, watershed: &str) -> Result<ThresholdTable, PipelineError> {
    let inputs = &config.inputs;

    if let Some(path) = &inputs.return_period_file {
        debug!(path = %path.display(), "reading return periods");
        return Ok(load_return_periods(path)?);
    }

    if config.database.enabled {
        let url = std::env::var(&config.database.url_env)
            .map_err(|_| PipelineError::MissingDatabaseUrl(config.database.url_env.clone()))?;
        let mut client = postgres::Client::connect(&url, postgres::NoTls).map_err(IngestError::from)?;
        debug!(era = %inputs.era, watershed, "querying return periods");
        return Ok(fetch_return_periods(&mut client, &inputs.era, watershed)?);
    }

    if let Some(root) = &inputs.return_period_root {
        let path = find_return_period_file(root, &inputs.era, watershed)?;
        debug!(path = %path.display(), "reading return periods");
        return Ok(load_return_periods(&path)?);
    }

    Err(PipelineError::NoReturnPeriodSource)
}

/// Summarizes one forecast directory and writes its table.
///
/// `watershed` defaults to the name of the directory's parent.
pub fn run_forecast(
    forecast_dir: &Path,
    watershed: Option<&str>,
    config: &SummaryConfig,
) -> Result<RunReport, PipelineError> {
    let watershed = match watershed {
        Some(name) => name.to_string(),
        None => watershed_of(forecast_dir)
            .ok_or_else(|| PipelineError::InvalidForecastDir(forecast_dir.to_path_buf()))?,
    };
    let file_name = summary_file_name(&config.output.file_prefix, &watershed, forecast_dir)
        .ok_or_else(|| PipelineError::InvalidForecastDir(forecast_dir.to_path_buf()))?;
    let output_file = forecast_dir.join(file_name);

    info!(forecast_dir = %forecast_dir.display(), %watershed, "summarizing forecast run");

    let stats = load_forecast_stats(forecast_dir, config)?;
    let thresholds = load_thresholds(config, &watershed)?;
    debug!(
        reaches = stats.reach_ids.len(),
        timestamps = stats.times.len(),
        thresholds = thresholds.len(),
        "inputs loaded"
    );

    let table = assemble(&stats, &thresholds)?;

    write_csv(&output_file, &table.rows).map_err(|source| PipelineError::Output {
        path: output_file.clone(),
        source,
    })?;

    let run = forecast_dir.display().to_string();
    log_run_summary(&run, table.reach_count, table.reaches_written(), table.skipped.len());

    Ok(RunReport::new(
        forecast_dir.to_path_buf(),
        watershed,
        output_file,
        &table,
    ))
}

/// Lists `<root>/<watershed>/<date>/` directories, sorted by path.
pub fn discover_forecast_dirs(root: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let mut dirs = Vec::new();
    for watershed in subdirectories(root)? {
        dirs.extend(subdirectories(&watershed)?);
    }
    dirs.sort();
    Ok(dirs)
}

fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let entries = std::fs::read_dir(dir).map_err(|source| PipelineError::Discovery {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect())
}

/// Summarizes every forecast run under `root` in parallel.
pub fn run_batch(root: &Path, config: &SummaryConfig) -> Result<BatchReport, PipelineError> {
    let dirs = discover_forecast_dirs(root)?;
    info!(root = %root.display(), runs = dirs.len(), "starting batch");

    let outcomes: Vec<(PathBuf, Result<RunReport, PipelineError>)> = dirs
        .into_par_iter()
        .map(|dir| {
            let outcome = run_forecast(&dir, None, config);
            (dir, outcome)
        })
        .collect();

    let mut report = BatchReport::default();
    for (dir, outcome) in outcomes {
        match outcome {
            Ok(run) => report.runs.push(run),
            Err(err) => {
                error!(forecast_dir = %dir.display(), "run failed: {}", err);
                report.failures.push(FailedRun {
                    forecast_dir: dir,
                    error: err.to_string(),
                });
            }
        }
    }

    Ok(report)
}
