//! The run summary handed back to callers.

use crate::error::{ConvergenceError, FailureKind};
use crate::state::{IterationRecord, RunStatus};
use raster_diff::{Raster, RasterSize};
use serde::Serialize;
use style_patch::Correction;

/// Serializable view of one iteration.
#[derive(Clone, Debug, Serialize)]
pub struct IterationSummary {
    pub index: u32,
    pub matched: bool,
    pub diff_ratio: f64,
    pub diff_pixel_count: u64,
    pub overlap_pixel_count: u64,
    pub overlap_width: u32,
    pub overlap_height: u32,
    pub reference_size: RasterSize,
    pub candidate_size: RasterSize,
    pub corrections_applied: Vec<Correction>,
    /// Diagnostic only; written out by report emitters.
    #[serde(skip)]
    pub diff_raster: Raster,
}

impl From<IterationRecord> for IterationSummary {
    fn from(record: IterationRecord) -> Self {
        let comparison = record.comparison;
        Self {
            index: record.index,
            matched: comparison.matched,
            diff_ratio: comparison.diff_ratio,
            diff_pixel_count: comparison.diff_pixel_count,
            overlap_pixel_count: comparison.overlap_pixel_count,
            overlap_width: comparison.overlap_width,
            overlap_height: comparison.overlap_height,
            reference_size: comparison.reference_size,
            candidate_size: comparison.candidate_size,
            corrections_applied: record.corrections_applied,
            diff_raster: comparison.diff_raster,
        }
    }
}

/// Complete description of how a run ended; produced for every run.
#[derive(Clone, Debug, Serialize)]
pub struct FinalReport {
    pub component: String,
    pub design: String,
    pub status: RunStatus,
    /// Ratio of the last comparison, if any comparison happened.
    pub final_diff_ratio: Option<f64>,
    pub iterations_run: u32,
    pub iteration_cap: u32,
    pub match_threshold: f64,
    pub reason: String,
    pub failure: Option<FailureKind>,
    pub iterations: Vec<IterationSummary>,
    /// The error that aborted the run, kept as a value.
    #[serde(skip)]
    pub error: Option<ConvergenceError>,
}

impl FinalReport {
    pub const fn converged(&self) -> bool {
        matches!(self.status, RunStatus::Converged)
    }

    /// Process status: 0 when converged, 1 for any failure.
    pub const fn exit_code(&self) -> i32 {
        if self.converged() { 0 } else { 1 }
    }
}
