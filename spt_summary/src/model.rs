/// ReturnPeriodThresholds, ThresholdTable, EnsembleStats, ClassifiedRow, error types
/// core data structures and error handling
///
/// Core data types for the forecast summary table.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O, only types, a handful of constants that are part of the
/// published output contract, and the error taxonomy.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::thresholds::{FloodColor, ReturnPeriod, Thickness};

// ---------------------------------------------------------------------------
// Output contract constants
// ---------------------------------------------------------------------------

/// Timestamp format of the `timestamp` column, e.g. `05/28/20 03:00`.
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%y %H:%M";

/// Spacing of the uniform output grid, in hours.
pub const GRID_STEP_HOURS: i64 = 3;

/// Return periods (years) with a threshold per reach, ascending.
pub const RETURN_PERIOD_YEARS: [u16; 6] = [2, 5, 10, 25, 50, 100];

/// Stable river reach identifier (the `rivid` / COMID of the routing network).
pub type ReachId = i64;

/// Rounds a discharge to 2 decimal places.
///
/// Ties go to the even neighbour of the scaled value, which is how the
/// historical summary tables were rounded. Downstream consumers compare
/// against those tables, so `0.125` must become `0.12`, not `0.13`.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

// ---------------------------------------------------------------------------
// Threshold types
// ---------------------------------------------------------------------------

/// Historical discharge thresholds for one reach, in the units of the
/// forecast (m³/s).
///
/// Thresholds are expected in ascending order:
///   return_2 <= return_5 <= return_10 <= return_25 <= return_50 <= return_100
///
/// The ordering is a property of the upstream return period dataset and is
/// not re-checked here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnPeriodThresholds {
    pub return_2: f64,
    pub return_5: f64,
    pub return_10: f64,
    pub return_25: f64,
    pub return_50: f64,
    pub return_100: f64,
}

impl ReturnPeriodThresholds {
    /// Thresholds paired with their return period, highest first.
    pub fn descending(&self) -> [(ReturnPeriod, f64); 6] {
        [
            (ReturnPeriod::Hundred, self.return_100),
            (ReturnPeriod::Fifty, self.return_50),
            (ReturnPeriod::TwentyFive, self.return_25),
            (ReturnPeriod::Ten, self.return_10),
            (ReturnPeriod::Five, self.return_5),
            (ReturnPeriod::Two, self.return_2),
        ]
    }
}

/// Return period thresholds for every reach of one region, keyed by reach.
///
/// Loaded once per forecast run and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdTable {
    by_reach: HashMap<ReachId, ReturnPeriodThresholds>,
}

impl ThresholdTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the thresholds of a reach.
    pub fn insert(&mut self, reach_id: ReachId, thresholds: ReturnPeriodThresholds) {
        self.by_reach.insert(reach_id, thresholds);
    }

    pub fn get(&self, reach_id: ReachId) -> Option<&ReturnPeriodThresholds> {
        self.by_reach.get(&reach_id)
    }

    pub fn len(&self) -> usize {
        self.by_reach.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_reach.is_empty()
    }
}

impl FromIterator<(ReachId, ReturnPeriodThresholds)> for ThresholdTable {
    fn from_iter<I: IntoIterator<Item = (ReachId, ReturnPeriodThresholds)>>(iter: I) -> Self {
        Self {
            by_reach: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Forecast input
// ---------------------------------------------------------------------------

/// Ensemble statistics of one forecast run, already reduced across members.
///
/// `max[i]` and `mean[i]` belong to `reach_ids[i]` and hold one value per
/// entry of `times`. The order of `reach_ids` is the order of the output
/// table.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleStats {
    pub reach_ids: Vec<ReachId>,
    /// Original forecast lead times, shared by every reach. Irregular.
    pub times: Vec<DateTime<Utc>>,
    pub max: Vec<Vec<f64>>,
    pub mean: Vec<Vec<f64>>,
}

// ---------------------------------------------------------------------------
// Output row
// ---------------------------------------------------------------------------

/// One line of the summary table: a reach at one grid timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRow {
    pub reach_id: ReachId,
    pub timestamp: DateTime<Utc>,
    /// Interpolated ensemble maximum, rounded to 2 decimals.
    pub max: f64,
    /// Interpolated ensemble mean, rounded to 2 decimals.
    pub mean: f64,
    pub color: FloodColor,
    pub thickness: Thickness,
    pub return_period: ReturnPeriod,
}

impl ClassifiedRow {
    /// The timestamp as written to the `timestamp` column.
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while building an interpolator from raw samples.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InterpolationError {
    /// Fewer than two samples; no segment can be built.
    #[error("insufficient data: got {n} samples, need at least 2")]
    InsufficientData { n: usize },
    /// `times[index]` is not strictly after `times[index - 1]`.
    #[error("sample times are not strictly increasing at index {index}")]
    NonMonotonicTime { index: usize },
    /// Sample times and values differ in length.
    #[error("length mismatch: {times} sample times but {values} values")]
    LengthMismatch { times: usize, values: usize },
}

/// Reasons a single reach is left out of the summary table.
///
/// None of these abort the run: the reach is skipped and recorded in the
/// run report.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReachError {
    #[error("reach {reach_id}: cannot interpolate {statistic}: {source}")]
    Interpolation {
        reach_id: ReachId,
        statistic: &'static str,
        #[source]
        source: InterpolationError,
    },
    #[error("reach {0}: no return period thresholds")]
    MissingThreshold(ReachId),
    #[error(
        "reach {reach_id}: series lengths disagree ({times} times, {max} max values, {mean} mean values)"
    )]
    LengthMismatch {
        reach_id: ReachId,
        times: usize,
        max: usize,
        mean: usize,
    },
}

impl ReachError {
    pub fn reach_id(&self) -> ReachId {
        match self {
            ReachError::Interpolation { reach_id, .. } => *reach_id,
            ReachError::MissingThreshold(reach_id) => *reach_id,
            ReachError::LengthMismatch { reach_id, .. } => *reach_id,
        }
    }
}

/// Errors that make a whole forecast run impossible to summarize.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RunError {
    /// The shared timestamp sequence cannot span a grid.
    #[error("forecast has {n} timestamps, need at least 2 to build the output grid")]
    InsufficientTimestamps { n: usize },
    /// The statistic arrays do not have one row per reach.
    #[error("ensemble arrays disagree: {reaches} reaches, {max_rows} max rows, {mean_rows} mean rows")]
    ShapeMismatch {
        reaches: usize,
        max_rows: usize,
        mean_rows: usize,
    },
}

/// Errors raised while reading forecast inputs.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot read netCDF file {path}: {source}")]
    NetCdf {
        path: PathBuf,
        #[source]
        source: netcdf::Error,
    },
    #[error("variable '{name}' not found in {path}")]
    MissingVariable { name: String, path: PathBuf },
    #[error("variable '{name}' in {path} has {got} dimensions, expected {expected}")]
    DimensionMismatch {
        name: String,
        path: PathBuf,
        expected: usize,
        got: usize,
    },
    #[error("database error: {0}")]
    Database(#[from] postgres::Error),
    /// A column-oriented input has columns of different lengths.
    #[error("column '{column}' has {got} entries, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        got: usize,
    },
    #[error("timestamp {0} is outside the representable range")]
    InvalidTimestamp(f64),
    #[error("no return period file matching '{pattern}' in {dir}")]
    ReturnPeriodFileNotFound { dir: PathBuf, pattern: String },
}
