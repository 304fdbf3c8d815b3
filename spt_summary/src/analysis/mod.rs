/// Numeric core of the summary table.
///
/// This module turns the irregular forecast lead times into the uniform
/// output grid and resamples each reach's statistics onto it.
///
/// Submodules:
/// - `grid`: the uniform 3-hour timestamp grid.
/// - `interpolate`: shape-preserving piecewise cubic interpolation.

pub mod grid;
pub mod interpolate;
