//! Flood severity classification of a forecast mean flow.
//!
//! Each grid timestamp of a reach gets three codes derived from the
//! interpolated ensemble mean:
//!   - a map color from the 2/10/50-year thresholds,
//!   - a line thickness from the flow magnitude alone,
//!   - the highest return period exceeded.
//!
//! Every comparison against a return period threshold is strict: a flow equal
//! to a threshold does not exceed it. The guard order in each classifier is
//! the contract; the tests below pin the boundaries.

use std::fmt;

use serde::Serialize;

use crate::model::ReturnPeriodThresholds;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// Map color of a reach, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FloodColor {
    Blue,
    Yellow,
    Red,
    Purple,
}

impl FloodColor {
    /// Color for `mean` against the reach's thresholds.
    pub fn classify(mean: f64, thresholds: &ReturnPeriodThresholds) -> Self {
        if mean > thresholds.return_50 {
            FloodColor::Purple
        } else if mean > thresholds.return_10 {
            FloodColor::Red
        } else if mean > thresholds.return_2 {
            FloodColor::Yellow
        } else {
            FloodColor::Blue
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FloodColor::Blue => "blue",
            FloodColor::Yellow => "yellow",
            FloodColor::Red => "red",
            FloodColor::Purple => "purple",
        }
    }
}

impl fmt::Display for FloodColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Thickness
// ---------------------------------------------------------------------------

/// Line thickness code, from "1" (smallest flows) to "6".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Thickness {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
}

/// Lower bound (inclusive) of each band above the first, highest first.
const THICKNESS_BANDS: [(f64, Thickness); 5] = [
    (30_000.0, Thickness::Six),
    (10_000.0, Thickness::Five),
    (1_500.0, Thickness::Four),
    (250.0, Thickness::Three),
    (20.0, Thickness::Two),
];

impl Thickness {
    /// Thickness band of a flow. Bands are left-inclusive: 20.0 is band "2".
    pub fn classify(mean: f64) -> Self {
        THICKNESS_BANDS
            .iter()
            .find(|(lower, _)| mean >= *lower)
            .map(|(_, band)| *band)
            .unwrap_or(Thickness::One)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Thickness::One => "1",
            Thickness::Two => "2",
            Thickness::Three => "3",
            Thickness::Four => "4",
            Thickness::Five => "5",
            Thickness::Six => "6",
        }
    }
}

impl fmt::Display for Thickness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Return period
// ---------------------------------------------------------------------------

/// Highest return period exceeded by the mean flow. `None` is written as "0".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ReturnPeriod {
    #[serde(rename = "0")]
    None,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "25")]
    TwentyFive,
    #[serde(rename = "50")]
    Fifty,
    #[serde(rename = "100")]
    Hundred,
}

impl ReturnPeriod {
    /// Checks thresholds from the 100-year down; the first one exceeded wins.
    pub fn classify(mean: f64, thresholds: &ReturnPeriodThresholds) -> Self {
        thresholds
            .descending()
            .iter()
            .find(|(_, threshold)| mean > *threshold)
            .map(|(period, _)| *period)
            .unwrap_or(ReturnPeriod::None)
    }

    /// Recurrence interval in years, 0 when no threshold is exceeded.
    pub fn years(&self) -> u16 {
        match self {
            ReturnPeriod::None => 0,
            ReturnPeriod::Two => 2,
            ReturnPeriod::Five => 5,
            ReturnPeriod::Ten => 10,
            ReturnPeriod::TwentyFive => 25,
            ReturnPeriod::Fifty => 50,
            ReturnPeriod::Hundred => 100,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnPeriod::None => "0",
            ReturnPeriod::Two => "2",
            ReturnPeriod::Five => "5",
            ReturnPeriod::Ten => "10",
            ReturnPeriod::TwentyFive => "25",
            ReturnPeriod::Fifty => "50",
            ReturnPeriod::Hundred => "100",
        }
    }
}

impl fmt::Display for ReturnPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Combined classification
// ---------------------------------------------------------------------------

/// The three severity codes of one reach at one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Severity {
    pub color: FloodColor,
    pub thickness: Thickness,
    pub return_period: ReturnPeriod,
}

/// Classifies a mean flow against a reach's return period thresholds.
///
/// Total over finite, non-negative flows. Negative or non-finite flows are
/// not checked; validating the ensemble statistics is the producer's job.
pub fn classify(mean: f64, thresholds: &ReturnPeriodThresholds) -> Severity {
    Severity {
        color: FloodColor::classify(mean, thresholds),
        thickness: Thickness::classify(mean),
        return_period: ReturnPeriod::classify(mean, thresholds),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RETURN_PERIOD_YEARS;

    fn thresholds() -> ReturnPeriodThresholds {
        ReturnPeriodThresholds {
            return_2: 10.0,
            return_5: 20.0,
            return_10: 100.0,
            return_25: 500.0,
            return_50: 1000.0,
            return_100: 5000.0,
        }
    }

    // --- Color --------------------------------------------------------------

    #[test]
    fn test_color_bands() {
        let t = thresholds();
        assert_eq!(FloodColor::classify(0.0, &t), FloodColor::Blue);
        assert_eq!(FloodColor::classify(15.0, &t), FloodColor::Yellow);
        assert_eq!(FloodColor::classify(150.0, &t), FloodColor::Red);
        assert_eq!(FloodColor::classify(1500.0, &t), FloodColor::Purple);
    }

    #[test]
    fn test_color_at_threshold_does_not_escalate() {
        let t = thresholds();
        assert_eq!(
            FloodColor::classify(1000.0, &t),
            FloodColor::Red,
            "mean equal to the 50-year threshold is red, not purple"
        );
        assert_eq!(FloodColor::classify(100.0, &t), FloodColor::Yellow);
        assert_eq!(FloodColor::classify(10.0, &t), FloodColor::Blue);
    }

    #[test]
    fn test_color_ignores_5_and_25_year_thresholds() {
        let t = thresholds();
        // Above the 25-year threshold but below the 50-year one: still red.
        assert_eq!(FloodColor::classify(750.0, &t), FloodColor::Red);
        // Above the 5-year threshold but below the 10-year one: still yellow.
        assert_eq!(FloodColor::classify(50.0, &t), FloodColor::Yellow);
    }

    // --- Thickness ----------------------------------------------------------

    #[test]
    fn test_thickness_band_edges_are_left_inclusive() {
        let cases = [
            (0.0, "1"),
            (19.99, "1"),
            (20.0, "2"),
            (249.99, "2"),
            (250.0, "3"),
            (1499.99, "3"),
            (1500.0, "4"),
            (9999.99, "4"),
            (10_000.0, "5"),
            (29_999.99, "5"),
            (30_000.0, "6"),
            (1.0e9, "6"),
        ];
        for (flow, expected) in cases {
            assert_eq!(
                Thickness::classify(flow).as_str(),
                expected,
                "thickness of {} should be {}",
                flow,
                expected
            );
        }
    }

    // --- Return period ------------------------------------------------------

    #[test]
    fn test_return_period_labels() {
        let t = thresholds();
        let cases = [
            (0.0, "0"),
            (10.0, "0"),
            (10.01, "2"),
            (20.0, "2"),
            (20.5, "5"),
            (100.0, "5"),
            (100.5, "10"),
            (500.0, "10"),
            (600.0, "25"),
            (1000.0, "25"),
            (1000.01, "50"),
            (5000.0, "50"),
            (5000.01, "100"),
        ];
        for (flow, expected) in cases {
            assert_eq!(
                ReturnPeriod::classify(flow, &t).as_str(),
                expected,
                "return period of {} should be {}",
                flow,
                expected
            );
        }
    }

    #[test]
    fn test_return_period_with_equal_thresholds_picks_highest() {
        // Flat thresholds are valid (non-decreasing); the highest exceeded wins.
        let t = ReturnPeriodThresholds {
            return_2: 50.0,
            return_5: 50.0,
            return_10: 50.0,
            return_25: 50.0,
            return_50: 50.0,
            return_100: 50.0,
        };
        assert_eq!(ReturnPeriod::classify(50.1, &t), ReturnPeriod::Hundred);
        assert_eq!(ReturnPeriod::classify(50.0, &t), ReturnPeriod::None);
    }

    #[test]
    fn test_descending_thresholds_cover_every_return_period() {
        let years: Vec<u16> = thresholds()
            .descending()
            .iter()
            .rev()
            .map(|(period, _)| period.years())
            .collect();
        assert_eq!(years, RETURN_PERIOD_YEARS.to_vec());
    }

    #[test]
    fn test_return_period_years() {
        assert_eq!(ReturnPeriod::None.years(), 0);
        assert_eq!(ReturnPeriod::TwentyFive.years(), 25);
        assert_eq!(ReturnPeriod::Hundred.years(), 100);
    }

    // --- Combined -----------------------------------------------------------

    #[test]
    fn test_severity_never_decreases_as_flow_rises() {
        let t = thresholds();
        let mut previous = classify(0.0, &t);
        let mut flow = 0.0;
        while flow < 40_000.0 {
            flow += 7.5;
            let current = classify(flow, &t);
            assert!(current.color >= previous.color, "color dropped at {}", flow);
            assert!(
                current.thickness >= previous.thickness,
                "thickness dropped at {}",
                flow
            );
            assert!(
                current.return_period >= previous.return_period,
                "return period dropped at {}",
                flow
            );
            previous = current;
        }
        assert_eq!(previous.color, FloodColor::Purple);
        assert_eq!(previous.thickness, Thickness::Six);
        assert_eq!(previous.return_period, ReturnPeriod::Hundred);
    }

    #[test]
    fn test_zero_thresholds_classify_any_positive_flow_as_most_severe() {
        let t = ReturnPeriodThresholds {
            return_2: 0.0,
            return_5: 0.0,
            return_10: 0.0,
            return_25: 0.0,
            return_50: 0.0,
            return_100: 0.0,
        };
        let s = classify(0.01, &t);
        assert_eq!(s.color, FloodColor::Purple);
        assert_eq!(s.return_period, ReturnPeriod::Hundred);
        assert_eq!(classify(0.0, &t).color, FloodColor::Blue);
    }

    #[test]
    fn test_display_matches_table_codes() {
        assert_eq!(FloodColor::Purple.to_string(), "purple");
        assert_eq!(Thickness::Four.to_string(), "4");
        assert_eq!(ReturnPeriod::None.to_string(), "0");
        assert_eq!(ReturnPeriod::Hundred.to_string(), "100");
    }
}
