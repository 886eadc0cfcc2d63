//! Per-run state owned by the controller.

use crate::ports::ReferenceImage;
use log::warn;
use raster_diff::ComparisonResult;
use serde::Serialize;
use style_patch::Correction;

/// Lifecycle of a run. `Converged`, `Exhausted` and `Aborted` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    Pending,
    Running,
    Converged,
    Exhausted,
    Aborted,
}

impl RunStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Converged | Self::Exhausted | Self::Aborted)
    }
}

/// One render/compare pass and whatever it patched afterwards.
#[derive(Clone, Debug)]
pub struct IterationRecord {
    /// 1-based.
    pub index: u32,
    pub comparison: ComparisonResult,
    pub corrections_applied: Vec<Correction>,
}

/// Everything a run accumulates. Created at `invoke()` and dropped with it.
#[derive(Debug)]
pub struct ConvergenceState {
    /// Fetched on first need, then reused for every iteration.
    pub reference: Option<ReferenceImage>,
    pub records: Vec<IterationRecord>,
    status: RunStatus,
}

impl Default for ConvergenceState {
    fn default() -> Self {
        Self {
            reference: None,
            records: Vec::new(),
            status: RunStatus::Pending,
        }
    }
}

impl ConvergenceState {
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Move to `next`. Once terminal the status is frozen and the request is
    /// refused with `false`.
    pub fn transition(&mut self, next: RunStatus) -> bool {
        if self.status.is_terminal() {
            warn!(
                "ignoring transition {:?} -> {next:?}: run already finished",
                self.status
            );
            return false;
        }
        self.status = next;
        true
    }

    pub fn last_record(&self) -> Option<&IterationRecord> {
        self.records.last()
    }

    pub fn iterations_run(&self) -> u32 {
        self.records.len() as u32
    }
}
