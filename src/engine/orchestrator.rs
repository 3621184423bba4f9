//! Orchestrator: the composition root.
//!
//! Wires one run end to end: accept the built tree, apply every
//! validator's subtree modification, drive the three lifecycle phases,
//! remove the injected observation nodes, and aggregate the outcomes into
//! a run report.

use crate::core::error::OrchestratorResult;
use crate::engine::lifecycle::LifecycleRunner;
use crate::engine::modify::{apply_modifications, resolve_targets};
use crate::engine::report::{aggregate, RunReport};
use crate::tree::arena::StageTree;
use crate::validator::registry::ValidatorRegistry;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Options for one orchestration run.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorOptions {
    /// Per-hook timeout. A hook exceeding it is treated as the phase's
    /// failure value for that validator; the underlying work is not
    /// forcibly aborted. `None` waits indefinitely.
    pub hook_timeout: Option<Duration>,
}

impl OrchestratorOptions {
    /// Create default options (no timeout).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-hook timeout.
    pub fn with_hook_timeout(mut self, timeout: Duration) -> Self {
        self.hook_timeout = Some(timeout);
        self
    }
}

/// The validation orchestrator.
///
/// Performs one orchestration run per invocation, over one tree. The tree
/// is built and deployed externally; the orchestrator only receives it.
pub struct Orchestrator {
    registry: ValidatorRegistry,
    options: OrchestratorOptions,
}

impl Orchestrator {
    /// Create an orchestrator over the given registry.
    pub fn new(registry: ValidatorRegistry) -> Self {
        Self {
            registry,
            options: OrchestratorOptions::default(),
        }
    }

    /// Set run options.
    pub fn with_options(mut self, options: OrchestratorOptions) -> Self {
        self.options = options;
        self
    }

    /// The registered validators.
    pub fn registry(&self) -> &ValidatorRegistry {
        &self.registry
    }

    /// Run one orchestration over the tree.
    ///
    /// Sequence: resolve targets, modification pass, setup-all,
    /// validate-all, breakdown-all, remove injected nodes, aggregate.
    /// Returns a complete [`RunReport`], or a contract violation if the
    /// tree was left in an indeterminate state; never a truncated report.
    /// Callers that keep a clone of the `Arc` can inspect the final tree
    /// shape after the run.
    pub fn run(&self, tree: Arc<StageTree>) -> OrchestratorResult<RunReport> {
        let start = Instant::now();
        log::info!(
            "starting orchestration run with {} validator(s) over {} stage(s)",
            self.registry.len(),
            tree.len()
        );

        let resolved = resolve_targets(&tree, &self.registry)?;
        apply_modifications(&tree, &resolved)?;

        let runner = LifecycleRunner::new(self.options.hook_timeout);
        let runs = runner.run(&tree, &resolved);

        // Injected observation nodes are destroyed after the whole
        // breakdown phase, keeping tree mutation serialized while hooks
        // may still be running within a phase. Original nodes are never
        // removed.
        for entry in &resolved {
            let removed = tree.remove_owned_by(&entry.registration.name);
            if removed > 0 {
                log::debug!(
                    "removed {} wrapper node(s) injected by validator '{}'",
                    removed,
                    entry.registration.name
                );
            }
        }

        let mut report = aggregate(runs);
        report.duration_ms = start.elapsed().as_millis() as u64;
        log::info!(
            "orchestration run finished in {} ms: {}",
            report.duration_ms,
            report.summary()
        );
        Ok(report)
    }
}
