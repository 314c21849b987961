//! Run reporting: acceptance/rejection tallies for one batch pass.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::error::AppError;
use crate::fit::event::RejectReason;

/// Per-reason rejection tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RejectCounts {
    pub invalid_waveform: usize,
    pub smoothing_failure: usize,
    pub no_active_region: usize,
    pub weak_fast_component: usize,
    pub invalid_slow_component: usize,
}

impl RejectCounts {
    pub fn record(&mut self, reason: &RejectReason) {
        match reason {
            RejectReason::InvalidWaveform(_) => self.invalid_waveform += 1,
            RejectReason::Smoothing(_) => self.smoothing_failure += 1,
            RejectReason::NoActiveRegion => self.no_active_region += 1,
            RejectReason::WeakFastComponent { .. } => self.weak_fast_component += 1,
            RejectReason::InvalidSlowComponent => self.invalid_slow_component += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.invalid_waveform
            + self.smoothing_failure
            + self.no_active_region
            + self.weak_fast_component
            + self.invalid_slow_component
    }
}

/// Outcome of one `pulsefit process` run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub files_found: usize,
    pub accepted: usize,
    pub rejected: RejectCounts,
}

/// Human-readable summary for the terminal.
pub fn format_summary(summary: &BatchSummary) -> String {
    let r = &summary.rejected;
    let mut out = format!(
        "Processed {} files: {} accepted, {} rejected",
        summary.files_found,
        summary.accepted,
        r.total()
    );
    if r.total() > 0 {
        out.push_str(&format!(
            "\n  invalid waveform: {}\n  smoothing failure: {}\n  no active region: {}\n  weak fast component: {}\n  invalid slow component: {}",
            r.invalid_waveform,
            r.smoothing_failure,
            r.no_active_region,
            r.weak_fast_component,
            r.invalid_slow_component
        ));
    }
    out
}

/// Write the summary as pretty JSON.
pub fn write_summary_json(path: &Path, summary: &BatchSummary) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create summary '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::io(format!("Failed to write summary JSON: {e}")))
}
