/// Uniform output time grid.
///
/// The grid starts at the first forecast lead time and advances in fixed
/// steps for as long as it stays at or before the last lead time. The last
/// lead time itself is only included when it lands exactly on a step.

use chrono::{DateTime, Duration, Utc};

use crate::model::{GRID_STEP_HOURS, RunError};

/// Builds the 3-hour grid spanning the forecast's original timestamps.
///
/// Fails when fewer than two timestamps are supplied, since no range can be
/// derived from them.
pub fn three_hour_grid(times: &[DateTime<Utc>]) -> Result<Vec<DateTime<Utc>>, RunError> {
    match times {
        [first, .., last] => Ok(uniform_grid(*first, *last, Duration::hours(GRID_STEP_HOURS))),
        _ => Err(RunError::InsufficientTimestamps { n: times.len() }),
    }
}

/// Points `start, start + step, ...` up to and including `end`.
///
/// Empty when `end` precedes `start`; a non-positive `step` yields `[start]`.
/// Stops early if the next step would leave the representable time range.
pub fn uniform_grid(start: DateTime<Utc>, end: DateTime<Utc>, step: Duration) -> Vec<DateTime<Utc>> {
    if end < start {
        return Vec::new();
    }
    if step <= Duration::zero() {
        return vec![start];
    }
    let mut grid = Vec::new();
    let mut next = Some(start);
    while let Some(t) = next.filter(|t| *t <= end) {
        grid.push(t);
        next = t.checked_add_signed(step);
    }
    grid
}

/// Offset of `t` from `origin` in fractional hours.
pub fn hours_since(origin: DateTime<Utc>, t: DateTime<Utc>) -> f64 {
    (t - origin).num_seconds() as f64 / 3600.0
}
