//! # Stagecheck - Validation Orchestration for Stage Trees
//!
//! Stagecheck coordinates independently-authored validator plugins against
//! a shared tree of deployed pipeline stages. Each validator may rewrite a
//! subtree before deployment finishes, provision auxiliary resources to
//! observe it, run a pass/fail check against live behavior, and tear down
//! whatever it provisioned. The engine makes many such validators safely
//! composable over one tree: modifications apply in registration order,
//! the three lifecycle phases run globally across all validators, partial
//! failures stay isolated, and cleanup is deterministic.
//!
//! ## Quick Start
//!
//! ```rust
//! use stagecheck::prelude::*;
//! use std::sync::Arc;
//!
//! // The external builder constructs the deployed stage tree.
//! let tree = StageTree::new("pipeline");
//! let root = tree.root();
//! tree.add_child(root, "ingestion").unwrap();
//! tree.add_child(root, "egress").unwrap();
//!
//! // Register validators; order is significant.
//! let mut registry = ValidatorRegistry::new();
//! registry
//!     .register(ValidatorRegistration::new(Arc::new(NoopValidator::new("smoke"))))
//!     .unwrap();
//!
//! // One orchestration run over one tree.
//! let orchestrator = Orchestrator::new(registry);
//! let report = orchestrator.run(Arc::new(tree)).unwrap();
//! assert!(report.success);
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: identifiers, metric values, outcomes, error handling
//! - [`tree`]: the [`BuiltStage`](tree::stage::BuiltStage) model and the
//!   shared [`StageTree`](tree::arena::StageTree) arena
//! - [`validator`]: the [`StageValidator`](validator::contract::StageValidator)
//!   contract and registration
//! - [`engine`]: subtree modification pass, lifecycle runner, result
//!   aggregation, and the orchestrator composition root
//!
//! ## Writing a Validator
//!
//! Implement [`StageValidator`](validator::contract::StageValidator):
//! only `name` and `validation` are mandatory; the modifier, setup, and
//! breakdown hooks default to no-ops that succeed.
//!
//! ```rust
//! use stagecheck::prelude::*;
//!
//! struct LogComparator;
//!
//! impl StageValidator for LogComparator {
//!     fn name(&self) -> &str {
//!         "log-comparator"
//!     }
//!
//!     fn validation(&self, _tree: &StageTree, _root: StageId, _subtree: StageId) -> ValidationOutcome {
//!         // Compare observed behavior against expectations here.
//!         ValidationOutcome::success().with_metric("matched_lines", 128i64)
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod engine;
pub mod tree;
pub mod validator;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use stagecheck::prelude::*;
/// ```
pub mod prelude {
    // Identifiers and errors
    pub use crate::core::error::{
        ContractViolation, OrchestratorError, OrchestratorResult, StageId, TreeError, TreeResult,
    };

    // Value and outcome types
    pub use crate::core::types::{MetricMap, MetricValue, ValidationOutcome, ValidatorConfig};

    // Tree
    pub use crate::tree::arena::StageTree;
    pub use crate::tree::stage::{BuiltStage, StageOrigin};

    // Validator contract and registration
    pub use crate::validator::contract::{
        ConcurrencyMode, NoopValidator, StageValidator, SubtreeTarget,
    };
    pub use crate::validator::registry::{ValidatorRegistration, ValidatorRegistry};

    // Engine
    pub use crate::engine::orchestrator::{Orchestrator, OrchestratorOptions};
    pub use crate::engine::report::{aggregate, ReportEntry, RunReport, ValidatorRun};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "stagecheck");
    }

    #[test]
    fn test_basic_tree_construction() {
        let tree = StageTree::new("pipeline");
        let root = tree.root();
        let ingest = tree.add_child(root, "ingestion").unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.subtree(ingest).unwrap().parent, Some(root));
    }

    #[test]
    fn test_smoke_run() {
        let _ = env_logger::builder().is_test(true).try_init();

        let tree = StageTree::new("pipeline");
        tree.add_child(tree.root(), "ingestion").unwrap();

        let mut registry = ValidatorRegistry::new();
        registry
            .register(ValidatorRegistration::new(Arc::new(NoopValidator::new(
                "smoke",
            ))))
            .unwrap();

        let report = Orchestrator::new(registry).run(Arc::new(tree)).unwrap();
        assert!(report.success);
        assert_eq!(report.len(), 1);
        assert_eq!(report.entries[0].validator_name, "smoke");
    }
}
