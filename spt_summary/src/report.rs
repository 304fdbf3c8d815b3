//! Run reports
//!
//! Every forecast run produces a `RunReport` describing what was written and
//! which reaches were left out and why. Batch runs collect one report per
//! forecast directory plus the runs that failed outright. Reports serialize
//! to JSON for the pipeline's monitoring.

use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;

use crate::logging::{FailureType, classify_reach_failure};
use crate::model::{ReachError, ReachId};
use crate::summary::SummaryTable;

// ============================================================================
// Report Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub timestamp: String,
    pub forecast_dir: PathBuf,
    pub watershed: String,
    pub output_file: PathBuf,
    pub grid_points: usize,
    pub reaches_total: usize,
    pub reaches_written: usize,
    pub rows_written: usize,
    pub skipped: Vec<SkippedReach>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedReach {
    pub reach_id: ReachId,
    pub kind: SkipKind,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    MissingThreshold,
    DataQuality,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedRun {
    pub forecast_dir: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub runs: Vec<RunReport>,
    pub failures: Vec<FailedRun>,
}

impl SkippedReach {
    pub fn from_error(err: &ReachError) -> Self {
        let kind = match classify_reach_failure(err) {
            FailureType::Coverage => SkipKind::MissingThreshold,
            FailureType::DataQuality => SkipKind::DataQuality,
        };
        Self {
            reach_id: err.reach_id(),
            kind,
            reason: err.to_string(),
        }
    }
}

impl RunReport {
    pub fn new(
        forecast_dir: PathBuf,
        watershed: String,
        output_file: PathBuf,
        table: &SummaryTable,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            forecast_dir,
            watershed,
            output_file,
            grid_points: table.grid.len(),
            reaches_total: table.reach_count,
            reaches_written: table.reaches_written(),
            rows_written: table.rows.len(),
            skipped: table.skipped.iter().map(SkippedReach::from_error).collect(),
        }
    }

    /// Skipped reaches of one kind.
    pub fn skipped_count(&self, kind: SkipKind) -> usize {
        self.skipped.iter().filter(|s| s.kind == kind).count()
    }
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

// ============================================================================
// Console Summaries
// ============================================================================

pub fn print_summary(report: &RunReport) {
    println!("\n═══════════════════════════════════════════════════════════════");
    println!("SUMMARY TABLE: {} ({})", report.watershed, report.forecast_dir.display());
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("Output:            {}", report.output_file.display());
    println!("Grid points:       {}", report.grid_points);
    println!(
        "Reaches written:   {}/{}  ({} rows)",
        report.reaches_written, report.reaches_total, report.rows_written
    );
    println!(
        "Reaches skipped:   {}  ({} without thresholds, {} malformed)",
        report.skipped.len(),
        report.skipped_count(SkipKind::MissingThreshold),
        report.skipped_count(SkipKind::DataQuality)
    );
    for skipped in report
        .skipped
        .iter()
        .filter(|s| s.kind == SkipKind::DataQuality)
    {
        println!("   - {}", skipped.reason);
    }
}

pub fn print_batch_summary(report: &BatchReport) {
    println!("\n═══════════════════════════════════════════════════════════════");
    println!("BATCH SUMMARY");
    println!("═══════════════════════════════════════════════════════════════");
    println!();

    let total = report.runs.len() + report.failures.len();
    let reaches_written: usize = report.runs.iter().map(|r| r.reaches_written).sum();
    let reaches_skipped: usize = report.runs.iter().map(|r| r.skipped.len()).sum();

    println!("Forecast runs:     {}/{} succeeded", report.runs.len(), total);
    println!("Reaches written:   {}", reaches_written);
    println!("Reaches skipped:   {}", reaches_skipped);

    if !report.failures.is_empty() {
        println!("\nFAILED RUNS ({}):", report.failures.len());
        for failure in &report.failures {
            println!("   - {}: {}", failure.forecast_dir.display(), failure.error);
        }
    }
}
