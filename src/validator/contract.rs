//! The validator contract.
//!
//! [`StageValidator`] is the interface every validator plugin implements.
//! It is a flat set of capabilities: one subtree rewrite before any setup
//! runs, then the three lifecycle hooks. Whether a validator's hooks may
//! run concurrently with other validators' is declared by a tag on its
//! registration, not by a separate trait.

use crate::core::error::StageId;
use crate::core::types::ValidationOutcome;
use crate::tree::arena::StageTree;
use serde::{Deserialize, Serialize};

/// How a validator's hooks are scheduled within each phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyMode {
    /// Hooks run to completion before the next validator in the phase.
    #[default]
    Synchronous,
    /// Hooks may run concurrently with other asynchronous validators'
    /// hooks of the same phase.
    Asynchronous,
}

/// Which part of the tree a validator is registered against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubtreeTarget {
    /// The whole tree; root and subtree arguments coincide.
    #[default]
    Root,
    /// A named subtree. Must exist when the run starts.
    Stage(StageId),
}

/// Contract implemented by every validator plugin.
///
/// All hooks receive the shared tree plus the root and subtree
/// identifiers the validator was registered against. Hooks must be
/// callable from worker threads; implementations hold their own state
/// behind interior mutability if they need any.
///
/// Hook semantics:
/// - `subtree_modifier` runs once, before any setup, in registration
///   order. Returning `false` declines the modification and promises that
///   nothing was inserted; inserting and then declining is a contract
///   violation that aborts the run.
/// - `setup` provisions auxiliary resources. Returning `false` marks the
///   validator failed without aborting the run; its `validation` hook is
///   skipped.
/// - `validation` returns the authoritative verdict. A failing outcome is
///   expected and non-fatal.
/// - `breakdown` releases whatever setup provisioned. It is invoked even
///   after a failed setup or validation, so it must tolerate a no-op
///   setup. Returning `false` records an incomplete teardown and nothing
///   more.
pub trait StageValidator: Send + Sync {
    /// Unique name of this validator within a run.
    fn name(&self) -> &str;

    /// Rewrite the subtree before deployment finishes.
    fn subtree_modifier(&self, tree: &StageTree, root: StageId, subtree: StageId) -> bool {
        let _ = (tree, root, subtree);
        true
    }

    /// Provision auxiliary resources needed to observe the subtree.
    fn setup(&self, tree: &StageTree, root: StageId, subtree: StageId) -> bool {
        let _ = (tree, root, subtree);
        true
    }

    /// Run the pass/fail check against live behavior.
    fn validation(&self, tree: &StageTree, root: StageId, subtree: StageId) -> ValidationOutcome;

    /// Tear down whatever setup provisioned.
    fn breakdown(&self, tree: &StageTree, root: StageId, subtree: StageId) -> bool {
        let _ = (tree, root, subtree);
        true
    }
}

/// A validator that trivially passes.
///
/// Performs no modification, no provisioning, and reports success with an
/// empty metric payload. Useful as a fixture and as the smallest possible
/// consumer of the contract.
pub struct NoopValidator {
    name: String,
}

impl NoopValidator {
    /// Create a no-op validator with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl StageValidator for NoopValidator {
    fn name(&self) -> &str {
        &self.name
    }

    fn validation(&self, _tree: &StageTree, _root: StageId, _subtree: StageId) -> ValidationOutcome {
        ValidationOutcome::success()
    }
}
