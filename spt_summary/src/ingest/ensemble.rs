/// Ensemble statistics readers
///
/// The ensemble aggregation step leaves one netCDF file per statistic in the
/// forecast directory, `nces.max.nc` and `nces.avg.nc`. Both carry the reach
/// identifiers `rivid`, the lead times `time` and the flows `Qout`
/// (reach by time). `time` is in seconds since the Unix epoch (UTC) and may
/// be fractional.
///
/// A column-oriented JSON document with the same variables is accepted too:
///
/// ```json
/// {
///   "rivid": [101, 102],
///   "time":  [1590624000, 1590627600, 1590638400],
///   "max":   [[5.0, 50.0, 5000.0], [1.0, 2.0, 3.0]],
///   "mean":  [[4.0, 45.0, 4200.0], [0.5, 1.5, 2.5]]
/// }
/// ```
///
/// `mean` is also accepted under the aggregator's name `avg`; any other
/// variable (e.g. `min`) is ignored.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::nc::{open_file, read_1d_f64, read_1d_i64, read_reach_rows};
use crate::model::{EnsembleStats, IngestError, round_to_cents};

// ============================================================================
// File Structure
// ============================================================================

#[derive(Debug, Deserialize)]
struct EnsembleFile {
    rivid: Vec<i64>,
    time: Vec<f64>,
    max: Vec<Vec<f64>>,
    #[serde(alias = "avg")]
    mean: Vec<Vec<f64>>,
}

// ============================================================================
// Readers
// ============================================================================

/// Read ensemble statistics from the aggregated netCDF files.
///
/// Reach identifiers and lead times are taken from the maximum file.
pub fn load_ensemble_netcdf(max_path: &Path, mean_path: &Path) -> Result<EnsembleStats, IngestError> {
    let max_file = open_file(max_path)?;
    let mean_file = open_file(mean_path)?;

    convert(EnsembleFile {
        rivid: read_1d_i64(&max_file, "rivid", max_path)?,
        time: read_1d_f64(&max_file, "time", max_path)?,
        max: read_reach_rows(&max_file, "Qout", max_path)?,
        mean: read_reach_rows(&mean_file, "Qout", mean_path)?,
    })
}

/// Read ensemble statistics from a JSON file.
pub fn load_ensemble(path: &Path) -> Result<EnsembleStats, IngestError> {
    let content = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: EnsembleFile = serde_json::from_str(&content).map_err(|source| IngestError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    convert(file)
}

/// Parse ensemble statistics from an in-memory JSON document.
pub fn parse_ensemble(json: &str) -> Result<EnsembleStats, IngestError> {
    let file: EnsembleFile = serde_json::from_str(json).map_err(|source| IngestError::Json {
        path: "<memory>".into(),
        source,
    })?;
    convert(file)
}

/// Converts epoch seconds to timestamps and rounds every value to 2 decimals,
/// the precision the aggregated statistics are published at.
///
/// Row counts of `max`/`mean` are left to the assembler to check, since a
/// mismatch there is a run-level failure rather than a read error. Per-row
/// lengths are left alone too: a short row skips only its own reach.
fn convert(file: EnsembleFile) -> Result<EnsembleStats, IngestError> {
    let times = file
        .time
        .iter()
        .map(|&secs| epoch_seconds(secs))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EnsembleStats {
        reach_ids: file.rivid,
        times,
        max: round_rows(file.max),
        mean: round_rows(file.mean),
    })
}

fn epoch_seconds(secs: f64) -> Result<DateTime<Utc>, IngestError> {
    if !secs.is_finite() {
        return Err(IngestError::InvalidTimestamp(secs));
    }
    let whole = secs.floor();
    let nanos = (((secs - whole) * 1e9).round() as u32).min(999_999_999);
    // `as` saturates, and saturated values fall outside chrono's range.
    DateTime::<Utc>::from_timestamp(whole as i64, nanos).ok_or(IngestError::InvalidTimestamp(secs))
}

fn round_rows(rows: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
    rows.into_iter()
        .map(|row| row.into_iter().map(round_to_cents).collect())
        .collect()
}
