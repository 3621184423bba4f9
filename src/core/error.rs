//! Error types for stagecheck.
//!
//! Uses thiserror for structured errors with context. The taxonomy follows
//! the run model: per-validator faults (failed setup, failed validation,
//! incomplete breakdown, timeout) are recorded in the run report and never
//! surface as errors; only contract violations abort a run, because they
//! leave the shared tree in an indeterminate state.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a stage in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageId(pub Uuid);

impl StageId {
    /// Create a new random stage ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a stage ID from a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for StageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Errors related to tree structure and mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeError {
    #[error("Stage {0} not found")]
    StageNotFound(StageId),

    #[error("Stage {0} is a deployed stage and cannot be removed")]
    NotInjected(StageId),
}

/// Fatal violations of the validator contract.
///
/// Any of these aborts the entire run immediately: no partial run report
/// is produced, because the shared tree can no longer be trusted.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractViolation {
    #[error("Validator '{0}' is already registered")]
    DuplicateName(String),

    #[error("Validator '{validator}' is registered against unknown subtree {stage}")]
    UnknownSubtree { validator: String, stage: StageId },

    #[error(
        "Validator '{validator}' inserted {inserted} node(s) and then declined its modification"
    )]
    PartialModification { validator: String, inserted: usize },

    #[error("Validator '{validator}' inserted node {stage} outside its declared subtree")]
    OutOfScopeInsertion { validator: String, stage: StageId },
}

/// Top-level error type for an orchestration run.
///
/// A run either produces a complete [`RunReport`](crate::engine::report::RunReport)
/// or fails with one of these; it never yields a truncated report.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Contract violation: {0}")]
    Contract(#[from] ContractViolation),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),
}

/// Result type alias for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Result type alias for orchestration operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_id_display() {
        let id = StageId::new();
        let display = format!("{}", id);
        assert_eq!(display.len(), 8);
    }

    #[test]
    fn test_violation_messages_name_the_validator() {
        let violation = ContractViolation::PartialModification {
            validator: "cloudwatch".to_string(),
            inserted: 2,
        };
        let message = violation.to_string();
        assert!(message.contains("cloudwatch"));
        assert!(message.contains('2'));
    }

    #[test]
    fn test_orchestrator_error_from_violation() {
        let err: OrchestratorError =
            ContractViolation::DuplicateName("metrics".to_string()).into();
        assert!(matches!(err, OrchestratorError::Contract(_)));
    }
}
