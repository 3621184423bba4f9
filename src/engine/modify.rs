//! Subtree modification pass.
//!
//! Gives every registered validator one opportunity to rewrite the portion
//! of the tree it cares about before any setup runs, so later lifecycle
//! phases observe the final tree shape. Modifiers run strictly in
//! registration order: validator N's modifier observes validator N-1's
//! insertions. That ordering is a documented contract, not an incidental
//! detail.

use crate::core::error::{ContractViolation, StageId};
use crate::tree::arena::StageTree;
use crate::validator::contract::SubtreeTarget;
use crate::validator::registry::{ValidatorRegistration, ValidatorRegistry};
use std::sync::Arc;

/// A registration with its subtree target resolved against a concrete tree.
#[derive(Debug)]
pub(crate) struct ResolvedRegistration {
    pub registration: Arc<ValidatorRegistration>,
    /// The node the validator operates on. Equals the root for
    /// whole-tree registrations.
    pub subtree: StageId,
}

/// Resolve every registration's target against the tree.
///
/// A registration naming a subtree that does not exist is a
/// [`ContractViolation::UnknownSubtree`]; nothing about the run can be
/// trusted after that, so resolution happens before any modifier is
/// invoked.
pub(crate) fn resolve_targets(
    tree: &StageTree,
    registry: &ValidatorRegistry,
) -> Result<Vec<ResolvedRegistration>, ContractViolation> {
    let mut resolved = Vec::with_capacity(registry.len());
    for registration in registry.registrations() {
        let subtree = match registration.target {
            SubtreeTarget::Root => tree.root(),
            SubtreeTarget::Stage(id) => {
                if !tree.contains(id) {
                    return Err(ContractViolation::UnknownSubtree {
                        validator: registration.name.clone(),
                        stage: id,
                    });
                }
                id
            }
        };
        resolved.push(ResolvedRegistration {
            registration: Arc::clone(registration),
            subtree,
        });
    }
    Ok(resolved)
}

/// Apply every validator's subtree rewrite, in registration order.
///
/// A modifier returning `true` keeps its insertions; returning `false`
/// declines the modification, which is only legal if it inserted nothing.
/// The tree's insertion journal is audited after every call: a declined
/// modification that left insertions behind, or an insertion outside the
/// validator's declared subtree, aborts the run.
pub(crate) fn apply_modifications(
    tree: &StageTree,
    resolved: &[ResolvedRegistration],
) -> Result<(), ContractViolation> {
    // Builder-side insertions are not part of any modifier's audit window.
    tree.take_journal();

    let root = tree.root();
    for entry in resolved {
        let name = entry.registration.name.as_str();
        log::debug!("running subtree modifier for validator '{}'", name);

        let retained = entry
            .registration
            .validator
            .subtree_modifier(tree, root, entry.subtree);
        let journal = tree.take_journal();

        if !retained {
            if !journal.is_empty() {
                return Err(ContractViolation::PartialModification {
                    validator: name.to_string(),
                    inserted: journal.len(),
                });
            }
            log::debug!("validator '{}' declined its modification", name);
            continue;
        }

        for record in &journal {
            if !tree.is_within(record.node, entry.subtree) {
                return Err(ContractViolation::OutOfScopeInsertion {
                    validator: name.to_string(),
                    stage: record.node,
                });
            }
        }
        if !journal.is_empty() {
            log::debug!(
                "validator '{}' inserted {} wrapper node(s)",
                name,
                journal.len()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::StageId;
    use crate::core::types::ValidationOutcome;
    use crate::validator::contract::{StageValidator, SubtreeTarget};
    use crate::validator::registry::ValidatorRegistration;

    /// Modifier behavior knobs for exercising the pass.
    struct ModifierValidator {
        name: String,
        insert: bool,
        retain: bool,
        insert_at_root: bool,
    }

    impl StageValidator for ModifierValidator {
        fn name(&self) -> &str {
            &self.name
        }

        fn subtree_modifier(&self, tree: &StageTree, root: StageId, subtree: StageId) -> bool {
            if self.insert {
                let parent = if self.insert_at_root { root } else { subtree };
                tree.insert_wrapper(parent, "tap", self.name.clone()).unwrap();
            }
            self.retain
        }

        fn validation(&self, _: &StageTree, _: StageId, _: StageId) -> ValidationOutcome {
            ValidationOutcome::success()
        }
    }

    fn registry_of(validators: Vec<ValidatorRegistration>) -> ValidatorRegistry {
        let mut registry = ValidatorRegistry::new();
        for v in validators {
            registry.register(v).unwrap();
        }
        registry
    }

    #[test]
    fn test_retained_insertions_survive() {
        let tree = StageTree::new("pipeline");
        let registry = registry_of(vec![ValidatorRegistration::new(Arc::new(
            ModifierValidator {
                name: "a".into(),
                insert: true,
                retain: true,
                insert_at_root: true,
            },
        ))]);

        let resolved = resolve_targets(&tree, &registry).unwrap();
        apply_modifications(&tree, &resolved).unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_decline_without_insertion_is_not_an_error() {
        let tree = StageTree::new("pipeline");
        let registry = registry_of(vec![ValidatorRegistration::new(Arc::new(
            ModifierValidator {
                name: "a".into(),
                insert: false,
                retain: false,
                insert_at_root: true,
            },
        ))]);

        let resolved = resolve_targets(&tree, &registry).unwrap();
        apply_modifications(&tree, &resolved).unwrap();
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_partial_modification_is_fatal() {
        let tree = StageTree::new("pipeline");
        let registry = registry_of(vec![ValidatorRegistration::new(Arc::new(
            ModifierValidator {
                name: "a".into(),
                insert: true,
                retain: false,
                insert_at_root: true,
            },
        ))]);

        let resolved = resolve_targets(&tree, &registry).unwrap();
        let err = apply_modifications(&tree, &resolved).unwrap_err();
        assert_eq!(
            err,
            ContractViolation::PartialModification {
                validator: "a".to_string(),
                inserted: 1,
            }
        );
    }

    #[test]
    fn test_out_of_scope_insertion_is_fatal() {
        let tree = StageTree::new("pipeline");
        let ingest = tree.add_child(tree.root(), "ingestion").unwrap();
        // Registered against the ingestion subtree but inserts at root.
        let registry = registry_of(vec![ValidatorRegistration::new(Arc::new(
            ModifierValidator {
                name: "a".into(),
                insert: true,
                retain: true,
                insert_at_root: true,
            },
        ))
        .with_target(SubtreeTarget::Stage(ingest))]);

        let resolved = resolve_targets(&tree, &registry).unwrap();
        let err = apply_modifications(&tree, &resolved).unwrap_err();
        assert!(matches!(err, ContractViolation::OutOfScopeInsertion { .. }));
    }

    #[test]
    fn test_unknown_subtree_rejected_at_resolution() {
        let tree = StageTree::new("pipeline");
        let missing = StageId::new();
        let registry = registry_of(vec![ValidatorRegistration::new(Arc::new(
            ModifierValidator {
                name: "a".into(),
                insert: false,
                retain: true,
                insert_at_root: true,
            },
        ))
        .with_target(SubtreeTarget::Stage(missing))]);

        let err = resolve_targets(&tree, &registry).unwrap_err();
        assert_eq!(
            err,
            ContractViolation::UnknownSubtree {
                validator: "a".to_string(),
                stage: missing,
            }
        );
    }
}
