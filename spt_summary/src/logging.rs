/// Structured logging for the summary table service
///
/// Events carry the reach and forecast run they belong to as fields, so a
/// skipped reach can be traced back from the log file of a batch run. Output
/// goes to stderr and, optionally, to an append-only log file.

use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use serde::Deserialize;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::prelude::*;

use crate::model::ReachError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl LogLevel {
    /// This level made chattier by `verbosity` steps (one per `-v`).
    pub fn raised_by(self, verbosity: u8) -> LogLevel {
        let levels = [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ];
        let base = levels.iter().position(|l| *l == self).unwrap_or(2);
        levels[(base + verbosity as usize).min(levels.len() - 1)]
    }

    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_filter().to_uppercase())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Initialization
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("cannot open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("global logger is already initialized")]
    AlreadyInitialized,
}

/// Initialize the global logger.
///
/// `RUST_LOG` overrides `min_level` when set. When `log_file` is given, the
/// same events are appended to it without terminal colors.
pub fn init_logger(min_level: LogLevel, log_file: Option<&Path>) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("spt_summary={}", min_level.as_filter())));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::LogFile {
                    path: path.to_path_buf(),
                    source,
                })?;
            Some(
                tracing_fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Reach outside the coverage of the return period dataset. Routine for
    /// regions whose routing network was extended after the thresholds were
    /// computed.
    Coverage,
    /// Reach whose forecast series is malformed.
    DataQuality,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Coverage => write!(f, "COVERAGE"),
            FailureType::DataQuality => write!(f, "DATA_QUALITY"),
        }
    }
}

/// Classify why a reach was skipped.
pub fn classify_reach_failure(err: &ReachError) -> FailureType {
    match err {
        ReachError::MissingThreshold(_) => FailureType::Coverage,
        ReachError::Interpolation { .. } | ReachError::LengthMismatch { .. } => {
            FailureType::DataQuality
        }
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a skipped reach with its classification.
///
/// Coverage gaps are routine and only logged at debug level; they are counted
/// in the run summary instead. Malformed series are warnings.
pub fn log_reach_skip(err: &ReachError) {
    let failure_type = classify_reach_failure(err);
    match failure_type {
        FailureType::Coverage => {
            debug!(reach_id = err.reach_id(), kind = %failure_type, "reach skipped: {}", err)
        }
        FailureType::DataQuality => {
            warn!(reach_id = err.reach_id(), kind = %failure_type, "reach skipped: {}", err)
        }
    }
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one forecast run.
pub fn log_run_summary(run: &str, total: usize, written: usize, skipped: usize) {
    let message = format!(
        "summary complete: {}/{} reaches written, {} skipped",
        written, total, skipped
    );

    if skipped == 0 {
        info!(run, "{}", message);
    } else if written == 0 {
        error!(run, "{}", message);
    } else {
        warn!(run, "{}", message);
    }
}
