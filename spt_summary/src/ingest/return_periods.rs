/// Return period threshold sources
///
/// Thresholds come from one of two places:
/// - a file per watershed and era with the variables `rivid`,
///   `return_period_2` ... `return_period_100`, found under
///   `<root>/<era>/<watershed>/`. The dataset ships as netCDF; a JSON
///   document with the same columns is read when the name ends in `.json`;
/// - a PostgreSQL table `return_periods` keyed by era and watershed.
///
/// Either way the result is a `ThresholdTable` built once per run.

use std::path::{Path, PathBuf};

use postgres::Client;
use serde::Deserialize;

use super::nc::{open_file, read_1d_f64, read_1d_i64};
use crate::model::{IngestError, ReachId, ReturnPeriodThresholds, ThresholdTable};

const THRESHOLD_VARIABLES: [&str; 6] = [
    "return_period_2",
    "return_period_5",
    "return_period_10",
    "return_period_25",
    "return_period_50",
    "return_period_100",
];

// ============================================================================
// File Source
// ============================================================================

#[derive(Debug, Deserialize)]
struct ReturnPeriodFile {
    rivid: Vec<i64>,
    return_period_2: Vec<f64>,
    return_period_5: Vec<f64>,
    return_period_10: Vec<f64>,
    return_period_25: Vec<f64>,
    return_period_50: Vec<f64>,
    return_period_100: Vec<f64>,
}

impl ReturnPeriodFile {
    fn into_table(self) -> Result<ThresholdTable, IngestError> {
        let expected = self.rivid.len();
        let columns = [
            &self.return_period_2,
            &self.return_period_5,
            &self.return_period_10,
            &self.return_period_25,
            &self.return_period_50,
            &self.return_period_100,
        ];
        for (column, values) in THRESHOLD_VARIABLES.into_iter().zip(columns) {
            if values.len() != expected {
                return Err(IngestError::ColumnLength {
                    column: column.to_string(),
                    expected,
                    got: values.len(),
                });
            }
        }

        Ok(self
            .rivid
            .iter()
            .enumerate()
            .map(|(i, &reach_id)| {
                (
                    reach_id,
                    ReturnPeriodThresholds {
                        return_2: self.return_period_2[i],
                        return_5: self.return_period_5[i],
                        return_10: self.return_period_10[i],
                        return_25: self.return_period_25[i],
                        return_50: self.return_period_50[i],
                        return_100: self.return_period_100[i],
                    },
                )
            })
            .collect())
    }
}

/// Read a return period table, as JSON when the file name ends in `.json`
/// and as netCDF otherwise.
pub fn load_return_periods(path: &Path) -> Result<ThresholdTable, IngestError> {
    if path.extension().is_some_and(|ext| ext == "json") {
        load_return_periods_json(path)
    } else {
        load_return_periods_netcdf(path)
    }
}

/// Read a return period table from a netCDF file.
pub fn load_return_periods_netcdf(path: &Path) -> Result<ThresholdTable, IngestError> {
    let file = open_file(path)?;
    let column = |name: &str| read_1d_f64(&file, name, path);

    ReturnPeriodFile {
        rivid: read_1d_i64(&file, "rivid", path)?,
        return_period_2: column("return_period_2")?,
        return_period_5: column("return_period_5")?,
        return_period_10: column("return_period_10")?,
        return_period_25: column("return_period_25")?,
        return_period_50: column("return_period_50")?,
        return_period_100: column("return_period_100")?,
    }
    .into_table()
}

/// Read a return period table from a JSON file.
pub fn load_return_periods_json(path: &Path) -> Result<ThresholdTable, IngestError> {
    let content = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ReturnPeriodFile = serde_json::from_str(&content).map_err(|source| IngestError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    file.into_table()
}

/// Parse a return period table from an in-memory JSON document.
pub fn parse_return_periods(json: &str) -> Result<ThresholdTable, IngestError> {
    let file: ReturnPeriodFile = serde_json::from_str(json).map_err(|source| IngestError::Json {
        path: "<memory>".into(),
        source,
    })?;
    file.into_table()
}

/// Locate the return period file of a watershed.
///
/// Looks in `<root>/<era>/<watershed>/` for a file named like
/// `*return_periods_<era>*.nc*`. When several match, the first in name order
/// wins. A `*return_periods_<era>*.json` file is used only when no netCDF
/// file matches.
pub fn find_return_period_file(root: &Path, era: &str, watershed: &str) -> Result<PathBuf, IngestError> {
    let dir = root.join(era).join(watershed);
    let pattern = format!("return_periods_{}", era);

    let entries = std::fs::read_dir(&dir).map_err(|source| IngestError::Io {
        path: dir.clone(),
        source,
    })?;

    let mut matches: Vec<(bool, PathBuf)> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?;
            let is_json = match_return_period_name(name, &pattern)?;
            Some((is_json, path))
        })
        .collect();
    // netCDF (false) sorts before JSON (true), then by name.
    matches.sort();

    matches
        .into_iter()
        .next()
        .map(|(_, path)| path)
        .ok_or(IngestError::ReturnPeriodFileNotFound { dir, pattern })
}

/// `Some(is_json)` when `name` holds `pattern` followed by a `.nc` or a
/// trailing `.json`.
fn match_return_period_name(name: &str, pattern: &str) -> Option<bool> {
    let at = name.find(pattern)?;
    let rest = &name[at + pattern.len()..];
    if rest.contains(".nc") {
        Some(false)
    } else if rest.ends_with(".json") {
        Some(true)
    } else {
        None
    }
}

// ============================================================================
// Database Source
// ============================================================================

/// Fetch the return periods of a watershed from PostgreSQL.
///
/// Expects a table
/// `return_periods(rivid BIGINT, era TEXT, watershed TEXT, rp_2 .. rp_100 DOUBLE PRECISION)`.
pub fn fetch_return_periods(
    client: &mut Client,
    era: &str,
    watershed: &str,
) -> Result<ThresholdTable, IngestError> {
    let rows = client.query(
        "SELECT rivid, rp_2, rp_5, rp_10, rp_25, rp_50, rp_100
         FROM return_periods
         WHERE era = $1 AND watershed = $2",
        &[&era, &watershed],
    )?;

    let mut table = ThresholdTable::new();
    for row in rows {
        let reach_id: ReachId = row.get(0);
        table.insert(
            reach_id,
            ReturnPeriodThresholds {
                return_2: row.get(1),
                return_5: row.get(2),
                return_10: row.get(3),
                return_25: row.get(4),
                return_50: row.get(5),
                return_100: row.get(6),
            },
        );
    }

    Ok(table)
}
