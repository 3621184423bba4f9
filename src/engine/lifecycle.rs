//! Lifecycle runner.
//!
//! Drives setup, validation, and breakdown as three full passes over all
//! validators: every setup returns before any validation starts, and every
//! validation returns before any breakdown starts. Late-registered
//! validators therefore never observe a partially-torn-down environment,
//! and no breakdown can run while another validator's validation still
//! depends on shared provisioned infrastructure.
//!
//! Within a phase, each hook call runs on its own worker thread and
//! reports back over a channel. Synchronous validators are awaited
//! immediately, one at a time, in registration order; asynchronous
//! validators are dispatched as independent tasks and drained at the end
//! of the phase. A timed-out or panicked hook yields the phase's failure
//! value for that validator only; the run moves on without aborting the
//! worker.

use crate::core::error::StageId;
use crate::core::types::ValidationOutcome;
use crate::engine::modify::ResolvedRegistration;
use crate::engine::report::ValidatorRun;
use crate::tree::arena::StageTree;
use crate::validator::contract::{ConcurrencyMode, StageValidator};
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

/// Hook signature shared by all three phases.
type Hook<R> = fn(&dyn StageValidator, &StageTree, StageId, StageId) -> R;

/// Executes the three lifecycle phases for one run.
pub(crate) struct LifecycleRunner {
    hook_timeout: Option<Duration>,
}

impl LifecycleRunner {
    pub fn new(hook_timeout: Option<Duration>) -> Self {
        Self { hook_timeout }
    }

    /// Run setup, validation, and breakdown over all validators.
    ///
    /// Returns one record per validator, in registration order.
    pub fn run(
        &self,
        tree: &Arc<StageTree>,
        resolved: &[ResolvedRegistration],
    ) -> Vec<ValidatorRun> {
        let setup = self.run_phase(
            "setup",
            tree,
            resolved,
            |v, t, root, subtree| v.setup(t, root, subtree),
            |_| true,
            || false,
        );

        // Validators whose setup was rejected are excluded from the
        // validation phase and get a synthetic failed outcome instead of a
        // verdict from an unprepared environment.
        let outcomes = self.run_phase(
            "validation",
            tree,
            resolved,
            |v, t, root, subtree| v.validation(t, root, subtree),
            |i| setup[i] == Some(true),
            ValidationOutcome::failure,
        );

        // Breakdown runs for every validator whose setup was invoked, even
        // after a failed setup, so resources provisioned before the
        // failure are still released.
        let breakdown = self.run_phase(
            "breakdown",
            tree,
            resolved,
            |v, t, root, subtree| v.breakdown(t, root, subtree),
            |_| true,
            || false,
        );

        resolved
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let setup_ok = setup[i] == Some(true);
                let outcome = outcomes[i].clone().unwrap_or_else(|| {
                    log::warn!(
                        "validator '{}': setup rejected, recording synthetic failure",
                        entry.registration.name
                    );
                    ValidationOutcome::failure()
                });
                ValidatorRun {
                    name: entry.registration.name.clone(),
                    setup_ok,
                    outcome,
                    breakdown_complete: breakdown[i] == Some(true),
                }
            })
            .collect()
    }

    /// Run one phase over all participating validators.
    ///
    /// Returns `None` for validators excluded by `participates`, the
    /// hook's value otherwise (or `fallback()` on timeout or panic).
    fn run_phase<R: Send + 'static>(
        &self,
        phase: &'static str,
        tree: &Arc<StageTree>,
        resolved: &[ResolvedRegistration],
        hook: Hook<R>,
        participates: impl Fn(usize) -> bool,
        fallback: impl Fn() -> R,
    ) -> Vec<Option<R>> {
        let root = tree.root();
        let mut results: Vec<Option<R>> = resolved.iter().map(|_| None).collect();
        let mut pending: Vec<(usize, Receiver<R>)> = Vec::new();

        for (i, entry) in resolved.iter().enumerate() {
            if !participates(i) {
                continue;
            }
            let rx = dispatch(hook, entry, tree, root);
            match entry.registration.mode {
                ConcurrencyMode::Synchronous => {
                    results[i] = Some(self.wait(phase, &entry.registration.name, rx, &fallback));
                }
                ConcurrencyMode::Asynchronous => pending.push((i, rx)),
            }
        }

        // The phase is complete only when every dispatched task has
        // finished (or been given up on).
        for (i, rx) in pending {
            let name = &resolved[i].registration.name;
            results[i] = Some(self.wait(phase, name, rx, &fallback));
        }
        results
    }

    /// Wait for one hook's result, applying the configured timeout.
    fn wait<R>(
        &self,
        phase: &'static str,
        name: &str,
        rx: Receiver<R>,
        fallback: &impl Fn() -> R,
    ) -> R {
        let received = match self.hook_timeout {
            Some(timeout) => rx.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => "timed out",
                RecvTimeoutError::Disconnected => "panicked",
            }),
            None => rx.recv().map_err(|_| "panicked"),
        };

        match received {
            Ok(result) => result,
            Err(reason) => {
                log::error!(
                    "validator '{}': {} hook {}, recording phase failure",
                    name,
                    phase,
                    reason
                );
                fallback()
            }
        }
    }
}

/// Dispatch one hook call onto a worker thread.
fn dispatch<R: Send + 'static>(
    hook: Hook<R>,
    entry: &ResolvedRegistration,
    tree: &Arc<StageTree>,
    root: StageId,
) -> Receiver<R> {
    let validator = Arc::clone(&entry.registration.validator);
    let tree = Arc::clone(tree);
    let subtree = entry.subtree;
    let (tx, rx) = bounded(1);
    std::thread::spawn(move || {
        let _ = tx.send(hook(validator.as_ref(), &tree, root, subtree));
    });
    rx
}
