/// Readers for the inputs of a forecast run.
///
/// Submodules:
/// - `ensemble`: per-reach ensemble maximum and mean at the forecast lead times.
/// - `return_periods`: per-reach return period thresholds, from files or PostgreSQL.

pub mod ensemble;
mod nc;
pub mod return_periods;
