//! Summary table assembly.
//!
//! Drives the interpolator and the classifier over every reach of a forecast
//! run. Reaches are independent, so they are processed in parallel; results
//! are merged back in the order the reaches appear in the ensemble arrays,
//! which is the row order downstream consumers index by.
//!
//! A reach either contributes one row for every grid timestamp or none at
//! all. Reaches that cannot be summarized are skipped and listed in
//! `SummaryTable::skipped`; they never stop the run.

use chrono::{DateTime, Utc};
use rayon::prelude::*;

use crate::alert::thresholds::classify;
use crate::analysis::grid::three_hour_grid;
use crate::analysis::interpolate::TimeInterpolator;
use crate::logging;
use crate::model::{
    ClassifiedRow, EnsembleStats, InterpolationError, ReachError, ReachId, RunError, ThresholdTable,
    round_to_cents,
};

/// Result of summarizing one forecast run.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    /// The shared output grid.
    pub grid: Vec<DateTime<Utc>>,
    /// Rows ordered by reach (input order), then by grid timestamp.
    pub rows: Vec<ClassifiedRow>,
    /// Reaches left out of `rows`, in input order.
    pub skipped: Vec<ReachError>,
    /// Number of reaches in the input.
    pub reach_count: usize,
}

impl SummaryTable {
    /// Number of reaches that made it into the table.
    pub fn reaches_written(&self) -> usize {
        self.reach_count - self.skipped.len()
    }
}

/// Builds the summary table of one forecast run.
///
/// Fails only when the run as a whole is unusable: fewer than two shared
/// timestamps, or statistic arrays that do not have one row per reach.
pub fn assemble(stats: &EnsembleStats, thresholds: &ThresholdTable) -> Result<SummaryTable, RunError> {
    let reach_count = stats.reach_ids.len();
    if stats.max.len() != reach_count || stats.mean.len() != reach_count {
        return Err(RunError::ShapeMismatch {
            reaches: reach_count,
            max_rows: stats.max.len(),
            mean_rows: stats.mean.len(),
        });
    }

    let grid = three_hour_grid(&stats.times)?;

    // Order-preserving collect: batch i belongs to reach_ids[i].
    let batches: Vec<Result<Vec<ClassifiedRow>, ReachError>> = (0..reach_count)
        .into_par_iter()
        .map(|i| {
            summarize_reach(
                stats.reach_ids[i],
                &stats.times,
                &stats.max[i],
                &stats.mean[i],
                &grid,
                thresholds,
            )
        })
        .collect();

    let mut rows = Vec::with_capacity(reach_count * grid.len());
    let mut skipped = Vec::new();
    for batch in batches {
        match batch {
            Ok(reach_rows) => rows.extend(reach_rows),
            Err(err) => {
                logging::log_reach_skip(&err);
                skipped.push(err);
            }
        }
    }

    Ok(SummaryTable {
        grid,
        rows,
        skipped,
        reach_count,
    })
}

/// Rows of a single reach, one per grid timestamp.
///
/// Values are interpolated from the raw samples, classified at full
/// precision, and rounded to 2 decimals for output.
pub fn summarize_reach(
    reach_id: ReachId,
    times: &[DateTime<Utc>],
    max: &[f64],
    mean: &[f64],
    grid: &[DateTime<Utc>],
    thresholds: &ThresholdTable,
) -> Result<Vec<ClassifiedRow>, ReachError> {
    let too_short = [("max", max.len()), ("mean", mean.len())]
        .into_iter()
        .find(|&(_, n)| n < 2);
    if let Some((statistic, n)) = too_short {
        return Err(ReachError::Interpolation {
            reach_id,
            statistic,
            source: InterpolationError::InsufficientData { n },
        });
    }
    if max.len() != times.len() || mean.len() != times.len() {
        return Err(ReachError::LengthMismatch {
            reach_id,
            times: times.len(),
            max: max.len(),
            mean: mean.len(),
        });
    }

    let max_curve = TimeInterpolator::new(times, max).map_err(|source| ReachError::Interpolation {
        reach_id,
        statistic: "max",
        source,
    })?;
    let mean_curve = TimeInterpolator::new(times, mean).map_err(|source| ReachError::Interpolation {
        reach_id,
        statistic: "mean",
        source,
    })?;

    let reach_thresholds = thresholds
        .get(reach_id)
        .ok_or(ReachError::MissingThreshold(reach_id))?;

    let max_values = max_curve.evaluate_many(grid);
    let mean_values = mean_curve.evaluate_many(grid);

    let rows = grid
        .iter()
        .zip(max_values.iter().zip(mean_values.iter()))
        .map(|(&timestamp, (&int_max, &int_mean))| {
            let severity = classify(int_mean, reach_thresholds);
            ClassifiedRow {
                reach_id,
                timestamp,
                max: round_to_cents(int_max),
                mean: round_to_cents(int_mean),
                color: severity.color,
                thickness: severity.thickness,
                return_period: severity.return_period,
            }
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::thresholds::{FloodColor, ReturnPeriod, Thickness};
    use crate::model::ReturnPeriodThresholds;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 5, 28, 0, 0, 0).unwrap()
    }

    fn times() -> Vec<DateTime<Utc>> {
        vec![t0(), t0() + Duration::hours(1), t0() + Duration::hours(5)]
    }

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

    fn stats(reach_ids: Vec<ReachId>) -> EnsembleStats {
        let n = reach_ids.len();
        EnsembleStats {
            reach_ids,
            times: times(),
            max: vec![vec![5.0, 50.0, 5000.0]; n],
            mean: vec![vec![5.0, 50.0, 5000.0]; n],
        }
    }

    // --- Single reach -------------------------------------------------------

    #[test]
    fn test_reach_rows_follow_grid() {
        let table: ThresholdTable = [(101, thresholds())].into_iter().collect();
        let grid = three_hour_grid(&times()).unwrap();
        let rows = summarize_reach(
            101,
            &times(),
            &[5.0, 50.0, 5000.0],
            &[5.0, 50.0, 5000.0],
            &grid,
            &table,
        )
        .expect("valid reach should summarize");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp, t0());
        assert_eq!(rows[0].mean, 5.0);
        assert_eq!(rows[0].color, FloodColor::Blue);
        assert_eq!(rows[0].thickness, Thickness::One);
        assert_eq!(rows[0].return_period, ReturnPeriod::None);

        let at_3h = &rows[1];
        assert_eq!(at_3h.timestamp, t0() + Duration::hours(3));
        assert!(at_3h.mean > 50.0 && at_3h.mean <= 5000.0);
        assert_eq!(at_3h.return_period, ReturnPeriod::Fifty);
        assert_eq!(at_3h.color, FloodColor::Purple);
    }

    #[test]
    fn test_values_are_rounded_to_two_decimals() {
        let table: ThresholdTable = [(1, thresholds())].into_iter().collect();
        let grid = three_hour_grid(&times()).unwrap();
        let rows = summarize_reach(
            1,
            &times(),
            &[1.0, 2.0, 3.333],
            &[1.0, 2.0, 3.333],
            &grid,
            &table,
        )
        .unwrap();
        for row in rows {
            assert_eq!(row.mean, round_to_cents(row.mean));
            assert_eq!(row.max, round_to_cents(row.max));
        }
    }

    #[test]
    fn test_missing_threshold_skips_reach() {
        let grid = three_hour_grid(&times()).unwrap();
        let result = summarize_reach(
            7,
            &times(),
            &[1.0, 2.0, 3.0],
            &[1.0, 2.0, 3.0],
            &grid,
            &ThresholdTable::new(),
        );
        assert_eq!(result, Err(ReachError::MissingThreshold(7)));
    }

    #[test]
    fn test_mismatched_series_lengths_skip_reach() {
        let table: ThresholdTable = [(7, thresholds())].into_iter().collect();
        let grid = three_hour_grid(&times()).unwrap();
        let result = summarize_reach(7, &times(), &[1.0, 2.0, 3.0], &[1.0, 2.0], &grid, &table);
        assert_eq!(
            result,
            Err(ReachError::LengthMismatch {
                reach_id: 7,
                times: 3,
                max: 3,
                mean: 2,
            })
        );
    }

    #[test]
    fn test_single_sample_reach_is_insufficient() {
        let table: ThresholdTable = [(7, thresholds())].into_iter().collect();
        let one = [t0()];
        let result = summarize_reach(7, &one, &[1.0], &[1.0], &[t0()], &table);
        assert_eq!(
            result,
            Err(ReachError::Interpolation {
                reach_id: 7,
                statistic: "max",
                source: InterpolationError::InsufficientData { n: 1 },
            })
        );
    }

    // --- Whole run ----------------------------------------------------------

    #[test]
    fn test_row_order_is_reach_major_in_input_order() {
        let ids = vec![300, 101, 200];
        let table: ThresholdTable = ids.iter().map(|&id| (id, thresholds())).collect();
        let summary = assemble(&stats(ids.clone()), &table).unwrap();

        assert_eq!(summary.rows.len(), ids.len() * summary.grid.len());
        let order: Vec<ReachId> = summary.rows.iter().map(|r| r.reach_id).collect();
        assert_eq!(order, vec![300, 300, 101, 101, 200, 200]);
        for chunk in summary.rows.chunks(summary.grid.len()) {
            let stamps: Vec<_> = chunk.iter().map(|r| r.timestamp).collect();
            assert_eq!(stamps, summary.grid);
        }
    }

    #[test]
    fn test_skipped_reach_does_not_affect_others() {
        let ids = vec![1, 2, 3];
        let table: ThresholdTable = [(1, thresholds()), (3, thresholds())].into_iter().collect();
        let summary = assemble(&stats(ids), &table).unwrap();

        assert_eq!(summary.skipped, vec![ReachError::MissingThreshold(2)]);
        assert_eq!(summary.reaches_written(), 2);
        assert_eq!(summary.rows.len(), 2 * summary.grid.len());
        assert!(summary.rows.iter().all(|r| r.reach_id != 2));
    }

    #[test]
    fn test_single_sample_reach_is_skipped_as_insufficient() {
        let mut s = stats(vec![1, 2, 3]);
        s.max[1] = vec![7.0];
        s.mean[1] = vec![7.0];
        let table: ThresholdTable = [1, 2, 3].iter().map(|&id| (id, thresholds())).collect();

        let summary = assemble(&s, &table).unwrap();

        assert_eq!(
            summary.skipped,
            vec![ReachError::Interpolation {
                reach_id: 2,
                statistic: "max",
                source: InterpolationError::InsufficientData { n: 1 },
            }]
        );
        assert_eq!(summary.reaches_written(), 2);
        let order: Vec<ReachId> = summary.rows.iter().map(|r| r.reach_id).collect();
        assert_eq!(order, vec![1, 1, 3, 3]);
    }

    #[test]
    fn test_short_mean_only_is_insufficient() {
        let table: ThresholdTable = [(7, thresholds())].into_iter().collect();
        let grid = three_hour_grid(&times()).unwrap();
        let result = summarize_reach(7, &times(), &[1.0, 2.0, 3.0], &[1.0], &grid, &table);
        assert!(matches!(
            result,
            Err(ReachError::Interpolation {
                statistic: "mean",
                source: InterpolationError::InsufficientData { n: 1 },
                ..
            })
        ));
    }

    #[test]
    fn test_non_monotonic_times_skip_reaches_without_failing_run() {
        // Lead times are shared, so every reach is skipped but the run stands.
        let mut s = stats(vec![1, 2]);
        s.times = vec![t0(), t0() + Duration::hours(4), t0() + Duration::hours(2)];
        let table: ThresholdTable = [1, 2].iter().map(|&id| (id, thresholds())).collect();

        let summary = assemble(&s, &table).expect("non-monotonic times are not run-fatal");

        assert!(summary.rows.is_empty());
        assert_eq!(summary.reaches_written(), 0);
        assert_eq!(summary.skipped.len(), 2);
        for (err, id) in summary.skipped.iter().zip([1, 2]) {
            assert_eq!(
                err,
                &ReachError::Interpolation {
                    reach_id: id,
                    statistic: "max",
                    source: InterpolationError::NonMonotonicTime { index: 2 },
                }
            );
        }
    }

    #[test]
    fn test_shape_mismatch_fails_run() {
        let mut s = stats(vec![1, 2]);
        s.mean.pop();
        assert_eq!(
            assemble(&s, &ThresholdTable::new()),
            Err(RunError::ShapeMismatch {
                reaches: 2,
                max_rows: 2,
                mean_rows: 1,
            })
        );
    }

    #[test]
    fn test_single_timestamp_fails_run() {
        let s = EnsembleStats {
            reach_ids: vec![1],
            times: vec![t0()],
            max: vec![vec![1.0]],
            mean: vec![vec![1.0]],
        };
        assert_eq!(
            assemble(&s, &ThresholdTable::new()),
            Err(RunError::InsufficientTimestamps { n: 1 })
        );
    }

    #[test]
    fn test_empty_reach_list_yields_empty_table() {
        let summary = assemble(&stats(vec![]), &ThresholdTable::new()).unwrap();
        assert!(summary.rows.is_empty());
        assert_eq!(summary.grid.len(), 2);
        assert_eq!(summary.reach_count, 0);
    }
}
