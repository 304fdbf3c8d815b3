//! TOML configuration for summary runs.
//!
//! Every section and field is optional; an empty file (or no file at all)
//! gives a configuration that reads `nces.max.nc` and `nces.avg.nc` from each
//! forecast directory and expects an explicit return period source on the
//! command line.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::logging::LogLevel;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SummaryConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub inputs: InputsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: LogLevel,
    /// Append log events to this file as well as stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputsConfig {
    /// Aggregated ensemble maximum inside each forecast directory (netCDF).
    #[serde(default = "default_max_file")]
    pub max_file: String,
    /// Aggregated ensemble mean inside each forecast directory (netCDF).
    #[serde(default = "default_mean_file")]
    pub mean_file: String,
    /// JSON ensemble statistics, read when `max_file` is absent.
    #[serde(default = "default_ensemble_file")]
    pub ensemble_file: String,
    /// A single return period file used for every run. Takes precedence over
    /// `return_period_root` and the database.
    pub return_period_file: Option<PathBuf>,
    /// Root of the return period tree, laid out as `<root>/<era>/<watershed>/`.
    pub return_period_root: Option<PathBuf>,
    /// Reanalysis era the return periods were computed from.
    #[serde(default = "default_era")]
    pub era: String,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            max_file: default_max_file(),
            mean_file: default_mean_file(),
            ensemble_file: default_ensemble_file(),
            return_period_file: None,
            return_period_root: None,
            era: default_era(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_prefix: default_file_prefix(),
        }
    }
}

/// Return periods served from PostgreSQL. The connection string is read
/// from `url_env` (after loading `.env`).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_url_env")]
    pub url_env: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url_env: default_url_env(),
        }
    }
}

fn default_level() -> LogLevel {
    LogLevel::Info
}
fn default_max_file() -> String {
    "nces.max.nc".to_string()
}
fn default_mean_file() -> String {
    "nces.avg.nc".to_string()
}
fn default_ensemble_file() -> String {
    "ensemble_stats.json".to_string()
}
fn default_era() -> String {
    "era_5".to_string()
}
fn default_file_prefix() -> String {
    "summary_table".to_string()
}
fn default_url_env() -> String {
    "DATABASE_URL".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Reads and parses a configuration file.
pub fn load_config(path: &Path) -> Result<SummaryConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })
}
