//! Run report and result aggregation.
//!
//! Aggregation is a pure function from the ordered per-validator records
//! to a [`RunReport`]: deterministic given the same inputs, no I/O. The
//! report is the sole externally observable artifact of a run; rendering
//! it is the caller's concern.

use crate::core::types::{MetricMap, ValidationOutcome};
use serde::{Deserialize, Serialize};

/// Everything recorded about one validator during one run.
///
/// Produced by the lifecycle runner, consumed by [`aggregate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorRun {
    /// Validator name.
    pub name: String,
    /// Whether setup succeeded. A rejection here means the validation
    /// hook was skipped and the outcome below is synthetic.
    pub setup_ok: bool,
    /// The verdict, authoritative or synthesized from a setup rejection.
    pub outcome: ValidationOutcome,
    /// Whether breakdown reported complete teardown. Recorded, never
    /// fatal.
    pub breakdown_complete: bool,
}

/// One entry in the run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Validator name.
    pub validator_name: String,
    /// The validator's verdict.
    pub is_validation_success: bool,
    /// Free-form metric payload from the validator.
    pub validation_data: MetricMap,
    /// Whether setup succeeded.
    pub setup_ok: bool,
    /// Whether teardown completed.
    pub breakdown_complete: bool,
}

/// Aggregated, ordered outcome of one orchestration run.
///
/// Has exactly one entry per registered validator that reached the setup
/// phase, in registration order. Failures are recorded, never silently
/// dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Per-validator entries in registration order.
    pub entries: Vec<ReportEntry>,
    /// Logical AND of all entries' validation success flags.
    pub success: bool,
    /// Wall-clock duration of the run in milliseconds.
    pub duration_ms: u64,
}

impl RunReport {
    /// Look up the entry for a validator by name.
    pub fn entry(&self, validator_name: &str) -> Option<&ReportEntry> {
        self.entries
            .iter()
            .find(|e| e.validator_name == validator_name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the report has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the report as pretty-printed JSON.
    ///
    /// Convenience for callers that persist or transmit the report;
    /// rendering beyond this is the caller's concern.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        let failed = self
            .entries
            .iter()
            .filter(|e| !e.is_validation_success)
            .count();
        if self.success {
            format!("{} validator(s) passed", self.entries.len())
        } else {
            format!(
                "{} of {} validator(s) failed",
                failed,
                self.entries.len()
            )
        }
    }
}

/// Fold the per-validator records into a run report.
pub fn aggregate(runs: Vec<ValidatorRun>) -> RunReport {
    let mut success = true;
    let entries: Vec<ReportEntry> = runs
        .into_iter()
        .map(|run| {
            success &= run.outcome.is_validation_success;
            ReportEntry {
                validator_name: run.name,
                is_validation_success: run.outcome.is_validation_success,
                validation_data: run.outcome.validation_data,
                setup_ok: run.setup_ok,
                breakdown_complete: run.breakdown_complete,
            }
        })
        .collect();

    RunReport {
        entries,
        success,
        duration_ms: 0,
    }
}
