//! Forecast summary tables for streamflow prediction.
//!
//! Resamples the ensemble maximum and mean of every forecasted river reach
//! onto a uniform 3-hour grid and classifies each mean against the reach's
//! historical return period thresholds.
//!
//! - `analysis`: output grid and shape-preserving interpolation.
//! - `alert`: color, thickness and return period classification.
//! - `summary`: assembly of the per-reach rows into the summary table.
//! - `ingest`, `output`, `pipeline`: reading inputs, writing the table,
//!   running one forecast directory or a whole output tree.

pub mod alert;
pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod summary;
