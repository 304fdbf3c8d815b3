//! Shape-preserving piecewise cubic interpolation (PCHIP).
//!
//! Node derivatives follow Fritsch & Carlson: zero at local extrema, a
//! weighted harmonic mean of the neighbouring secants elsewhere, and a
//! one-sided three-point estimate clamped for monotonicity at both ends.
//! Between two samples the curve stays inside the range of those samples,
//! so the interpolated ensemble maximum never peaks higher than the raw
//! forecast does.
//!
//! Queries outside the sample range evaluate the cubic of the nearest
//! boundary segment.

use chrono::{DateTime, Utc};

use crate::analysis::grid::hours_since;
use crate::model::InterpolationError;

/// A PCHIP curve through `(xs[i], ys[i])`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pchip {
    xs: Vec<f64>,
    ys: Vec<f64>,
    slopes: Vec<f64>,
}

impl Pchip {
    /// Builds the curve. `xs` must be strictly increasing with at least two
    /// points, and `ys` must have one value per point.
    pub fn new(xs: &[f64], ys: &[f64]) -> Result<Self, InterpolationError> {
        if xs.len() != ys.len() {
            return Err(InterpolationError::LengthMismatch {
                times: xs.len(),
                values: ys.len(),
            });
        }
        if xs.len() < 2 {
            return Err(InterpolationError::InsufficientData { n: xs.len() });
        }
        if let Some(index) = (1..xs.len()).find(|&i| !(xs[i] > xs[i - 1])) {
            return Err(InterpolationError::NonMonotonicTime { index });
        }

        Ok(Self {
            slopes: node_slopes(xs, ys),
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        })
    }

    /// Value of the curve at `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        let i = segment_index(&self.xs, x);
        hermite(
            (self.xs[i], self.xs[i + 1]),
            (self.ys[i], self.ys[i + 1]),
            (self.slopes[i], self.slopes[i + 1]),
            x,
        )
    }

    pub fn evaluate_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }
}

/// A PCHIP curve over forecast timestamps.
///
/// Time is measured in hours from the first sample; the scale does not change
/// the interpolated values.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeInterpolator {
    origin: DateTime<Utc>,
    curve: Pchip,
}

impl TimeInterpolator {
    pub fn new(times: &[DateTime<Utc>], values: &[f64]) -> Result<Self, InterpolationError> {
        let Some(&origin) = times.first() else {
            return Err(InterpolationError::InsufficientData { n: 0 });
        };
        let xs: Vec<f64> = times.iter().map(|&t| hours_since(origin, t)).collect();
        Ok(Self {
            origin,
            curve: Pchip::new(&xs, values)?,
        })
    }

    pub fn evaluate(&self, t: DateTime<Utc>) -> f64 {
        self.curve.evaluate(hours_since(self.origin, t))
    }

    /// One interpolated value per query time, in query order.
    pub fn evaluate_many(&self, times: &[DateTime<Utc>]) -> Vec<f64> {
        times.iter().map(|&t| self.evaluate(t)).collect()
    }
}

// ---------------------------------------------------------------------------
// Curve construction
// ---------------------------------------------------------------------------

fn node_slopes(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let secants: Vec<f64> = (0..n - 1).map(|i| (ys[i + 1] - ys[i]) / h[i]).collect();

    // Two points: the straight line through them.
    if n == 2 {
        return vec![secants[0]; 2];
    }

    let mut slopes = vec![0.0; n];
    for k in 1..n - 1 {
        let (m0, m1) = (secants[k - 1], secants[k]);
        // Flat or turning: a local extremum must have a zero derivative.
        if m0 * m1 <= 0.0 {
            continue;
        }
        let w1 = 2.0 * h[k] + h[k - 1];
        let w2 = h[k] + 2.0 * h[k - 1];
        slopes[k] = (w1 + w2) / (w1 / m0 + w2 / m1);
    }

    slopes[0] = endpoint_slope(h[0], h[1], secants[0], secants[1]);
    slopes[n - 1] = endpoint_slope(h[n - 2], h[n - 3], secants[n - 2], secants[n - 3]);
    slopes
}

/// Non-centered three-point derivative at an end node, limited so the end
/// segment cannot overshoot.
fn endpoint_slope(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if signum(d) != signum(m0) {
        0.0
    } else if signum(m0) != signum(m1) && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}

fn signum(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Index `i` of the segment `[xs[i], xs[i + 1]]` used for `x`, clamped to the
/// first and last segments for out-of-range queries.
fn segment_index(xs: &[f64], x: f64) -> usize {
    let last = xs.len() - 2;
    // Number of nodes at or before x, minus one.
    let upper = xs.partition_point(|&node| node <= x);
    upper.saturating_sub(1).min(last)
}

/// Cubic Hermite polynomial on one segment.
fn hermite((x0, x1): (f64, f64), (y0, y1): (f64, f64), (d0, d1): (f64, f64), x: f64) -> f64 {
    let h = x1 - x0;
    let t = (x - x0) / h;
    let t2 = t * t;
    let t3 = t2 * t;
    (2.0 * t3 - 3.0 * t2 + 1.0) * y0
        + (t3 - 2.0 * t2 + t) * h * d0
        + (-2.0 * t3 + 3.0 * t2) * y1
        + (t3 - t2) * h * d1
}
