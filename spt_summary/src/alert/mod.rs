/// Severity classification of forecast flows.
///
/// Submodules:
/// - `thresholds`: color, thickness and return period codes from a mean flow.

pub mod thresholds;
