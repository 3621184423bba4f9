//! Stage tree storage and mutation.
//!
//! The tree is an arena of stages addressed by [`StageId`]. The arena is
//! the only shared mutable resource in a run: every validator reads it,
//! and mutation happens only through [`StageTree::insert_wrapper`] and the
//! engine-side removal of injected nodes.
//!
//! Locking discipline: the slot map sits behind an `RwLock` taken for
//! write only when slots are added or removed; each slot's child list has
//! its own `Mutex`, so insertion is atomic with respect to concurrent
//! modifiers targeting the same parent while insertions into disjoint
//! subtrees proceed in parallel. Validators address the tree by id and
//! receive owned [`BuiltStage`] snapshots, never references into the
//! arena.

use crate::core::error::{StageId, TreeError, TreeResult};
use crate::tree::stage::{BuiltStage, StageOrigin};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};

/// One wrapper insertion, recorded for contract auditing.
///
/// The modification pass drains these after each modifier call to detect
/// partial modifications and out-of-scope insertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionRecord {
    /// Parent the wrapper was appended under.
    pub parent: StageId,
    /// The injected node.
    pub node: StageId,
    /// Name of the validator that owns the node.
    pub owner: String,
}

/// Arena slot for a single stage.
#[derive(Debug)]
struct StageSlot {
    kind: String,
    parent: Option<StageId>,
    origin: StageOrigin,
    children: Mutex<Vec<StageId>>,
}

impl StageSlot {
    fn snapshot(&self, id: StageId) -> BuiltStage {
        BuiltStage {
            id,
            kind: self.kind.clone(),
            parent: self.parent,
            children: self.children.lock().clone(),
            origin: self.origin.clone(),
        }
    }
}

/// The shared stage tree.
///
/// Built by the external deployment builder via [`StageTree::new`] and
/// [`StageTree::add_child`], then handed to the orchestrator. The engine
/// never constructs a root tree itself.
#[derive(Debug)]
pub struct StageTree {
    root: StageId,
    slots: RwLock<IndexMap<StageId, StageSlot>>,
    journal: Mutex<Vec<InsertionRecord>>,
}

impl StageTree {
    /// Create a tree with a single deployed root stage of the given kind.
    pub fn new(kind: impl Into<String>) -> Self {
        let root = StageId::new();
        let mut slots = IndexMap::new();
        slots.insert(
            root,
            StageSlot {
                kind: kind.into(),
                parent: None,
                origin: StageOrigin::Deployed,
                children: Mutex::new(Vec::new()),
            },
        );
        Self {
            root,
            slots: RwLock::new(slots),
            journal: Mutex::new(Vec::new()),
        }
    }

    /// The tree root.
    pub fn root(&self) -> StageId {
        self.root
    }

    /// Snapshot the stage with the given identifier.
    pub fn subtree(&self, id: StageId) -> TreeResult<BuiltStage> {
        let slots = self.slots.read();
        slots
            .get(&id)
            .map(|slot| slot.snapshot(id))
            .ok_or(TreeError::StageNotFound(id))
    }

    /// Append a deployed child stage under `parent`.
    ///
    /// Builder-side operation, used before orchestration starts.
    pub fn add_child(&self, parent: StageId, kind: impl Into<String>) -> TreeResult<StageId> {
        self.append(parent, kind.into(), StageOrigin::Deployed)
    }

    /// Append a validator-injected wrapper stage as the last child of `parent`.
    ///
    /// Fails with [`TreeError::StageNotFound`] if the parent does not
    /// exist. The insertion is recorded in the journal for contract
    /// auditing by the modification pass.
    pub fn insert_wrapper(
        &self,
        parent: StageId,
        kind: impl Into<String>,
        owner: impl Into<String>,
    ) -> TreeResult<StageId> {
        let owner = owner.into();
        let node = self.append(
            parent,
            kind.into(),
            StageOrigin::Injected {
                owner: owner.clone(),
            },
        )?;
        self.journal.lock().push(InsertionRecord {
            parent,
            node,
            owner,
        });
        Ok(node)
    }

    fn append(&self, parent: StageId, kind: String, origin: StageOrigin) -> TreeResult<StageId> {
        let id = StageId::new();

        // Slot allocation takes the map write lock; the child-list append
        // below only needs the parent's own mutex.
        {
            let mut slots = self.slots.write();
            if !slots.contains_key(&parent) {
                return Err(TreeError::StageNotFound(parent));
            }
            slots.insert(
                id,
                StageSlot {
                    kind,
                    parent: Some(parent),
                    origin,
                    children: Mutex::new(Vec::new()),
                },
            );
        }

        let slots = self.slots.read();
        let parent_slot = slots.get(&parent).ok_or(TreeError::StageNotFound(parent))?;
        parent_slot.children.lock().push(id);
        Ok(id)
    }

    /// Remove an injected wrapper node and its injected descendants.
    ///
    /// Deployed stages are never removable: attempting to remove one fails
    /// with [`TreeError::NotInjected`]. Injected nodes only ever parent
    /// other injected nodes, so the removal never touches deployed stages.
    pub fn remove_wrapper(&self, id: StageId) -> TreeResult<()> {
        let mut slots = self.slots.write();

        match slots.get(&id) {
            None => return Err(TreeError::StageNotFound(id)),
            Some(slot) if !slot.origin.is_injected() => {
                return Err(TreeError::NotInjected(id));
            }
            Some(_) => {}
        }

        // Unlink from the parent's child list.
        if let Some(parent) = slots.get(&id).and_then(|slot| slot.parent) {
            if let Some(parent_slot) = slots.get(&parent) {
                parent_slot.children.lock().retain(|child| *child != id);
            }
        }

        // Remove the node and everything below it.
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(slot) = slots.shift_remove(&current) {
                pending.extend(slot.children.into_inner());
            }
        }
        Ok(())
    }

    /// Remove every injected node owned by the named validator.
    ///
    /// Returns the number of top-level wrappers removed. Engine-side
    /// cleanup, run after the breakdown phase completes.
    pub fn remove_owned_by(&self, owner: &str) -> usize {
        let owned: Vec<StageId> = {
            let slots = self.slots.read();
            slots
                .iter()
                .filter(|(_, slot)| slot.origin.owner() == Some(owner))
                .map(|(id, _)| *id)
                .collect()
        };

        let mut removed = 0;
        for id in owned {
            // Descendants of an earlier removal may already be gone.
            if self.remove_wrapper(id).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    /// Whether `node` lies within the subtree rooted at `ancestor`.
    pub fn is_within(&self, node: StageId, ancestor: StageId) -> bool {
        let slots = self.slots.read();
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = slots.get(&id).and_then(|slot| slot.parent);
        }
        false
    }

    /// Check if a stage exists.
    pub fn contains(&self, id: StageId) -> bool {
        self.slots.read().contains_key(&id)
    }

    /// Number of stages in the tree.
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Check if the tree is empty. A built tree always has a root.
    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    /// Snapshot all stages in insertion order.
    pub fn stages(&self) -> Vec<BuiltStage> {
        let slots = self.slots.read();
        slots.iter().map(|(id, slot)| slot.snapshot(*id)).collect()
    }

    /// Drain the insertion journal.
    ///
    /// Consumed by the modification pass after each modifier call.
    pub(crate) fn take_journal(&self) -> Vec<InsertionRecord> {
        std::mem::take(&mut *self.journal.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_stage_tree() -> (StageTree, StageId, StageId, StageId) {
        let tree = StageTree::new("pipeline");
        let root = tree.root();
        let ingest = tree.add_child(root, "ingestion").unwrap();
        let egress = tree.add_child(root, "egress").unwrap();
        (tree, root, ingest, egress)
    }

    #[test]
    fn test_child_order_is_insertion_order() {
        let (tree, root, ingest, egress) = three_stage_tree();
        let snapshot = tree.subtree(root).unwrap();
        assert_eq!(snapshot.children, vec![ingest, egress]);
    }

    #[test]
    fn test_subtree_not_found() {
        let (tree, ..) = three_stage_tree();
        let missing = StageId::new();
        assert_eq!(tree.subtree(missing), Err(TreeError::StageNotFound(missing)));
    }

    #[test]
    fn test_insert_wrapper_appends_last() {
        let (tree, root, _, egress) = three_stage_tree();
        let wrapper = tree.insert_wrapper(root, "log-tap", "cloudwatch").unwrap();

        let snapshot = tree.subtree(root).unwrap();
        assert_eq!(snapshot.children.last(), Some(&wrapper));

        let node = tree.subtree(wrapper).unwrap();
        assert!(node.is_injected());
        assert_eq!(node.origin.owner(), Some("cloudwatch"));
        assert_eq!(node.parent, Some(root));

        // Deployed children untouched.
        assert!(tree.subtree(egress).is_ok());
    }

    #[test]
    fn test_insert_wrapper_missing_parent() {
        let (tree, ..) = three_stage_tree();
        let missing = StageId::new();
        let result = tree.insert_wrapper(missing, "log-tap", "cloudwatch");
        assert_eq!(result, Err(TreeError::StageNotFound(missing)));
        // Nothing recorded in the journal for a failed insert.
        assert!(tree.take_journal().is_empty());
    }

    #[test]
    fn test_remove_wrapper_rejects_deployed() {
        let (tree, _, ingest, _) = three_stage_tree();
        assert_eq!(tree.remove_wrapper(ingest), Err(TreeError::NotInjected(ingest)));
    }

    #[test]
    fn test_remove_wrapper_removes_injected_descendants() {
        let (tree, root, ..) = three_stage_tree();
        let outer = tree.insert_wrapper(root, "tap", "a").unwrap();
        let inner = tree.insert_wrapper(outer, "probe", "a").unwrap();

        tree.remove_wrapper(outer).unwrap();
        assert!(!tree.contains(outer));
        assert!(!tree.contains(inner));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_remove_owned_by_is_per_validator() {
        let (tree, root, ingest, _) = three_stage_tree();
        tree.insert_wrapper(root, "tap", "a").unwrap();
        let kept = tree.insert_wrapper(ingest, "probe", "b").unwrap();

        assert_eq!(tree.remove_owned_by("a"), 1);
        assert!(tree.contains(kept));
        assert_eq!(tree.remove_owned_by("a"), 0);
    }

    #[test]
    fn test_journal_records_insertions() {
        let (tree, root, ..) = three_stage_tree();
        let wrapper = tree.insert_wrapper(root, "tap", "cloudwatch").unwrap();

        let journal = tree.take_journal();
        assert_eq!(journal.len(), 1);
        assert_eq!(journal[0].parent, root);
        assert_eq!(journal[0].node, wrapper);
        assert_eq!(journal[0].owner, "cloudwatch");

        // Drained.
        assert!(tree.take_journal().is_empty());
    }

    #[test]
    fn test_is_within() {
        let (tree, root, ingest, egress) = three_stage_tree();
        let wrapper = tree.insert_wrapper(ingest, "tap", "a").unwrap();

        assert!(tree.is_within(wrapper, ingest));
        assert!(tree.is_within(wrapper, root));
        assert!(!tree.is_within(wrapper, egress));
        assert!(tree.is_within(root, root));
    }

    #[test]
    fn test_concurrent_insertion_disjoint_parents() {
        let (tree, _, ingest, egress) = three_stage_tree();
        let tree = std::sync::Arc::new(tree);

        let handles: Vec<_> = [(ingest, "a"), (egress, "b")]
            .into_iter()
            .flat_map(|(parent, owner)| {
                (0..8).map(move |_| (parent, owner.to_string()))
            })
            .map(|(parent, owner)| {
                let tree = tree.clone();
                std::thread::spawn(move || {
                    tree.insert_wrapper(parent, "tap", owner).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tree.subtree(ingest).unwrap().children.len(), 8);
        assert_eq!(tree.subtree(egress).unwrap().children.len(), 8);
        assert_eq!(tree.take_journal().len(), 16);
    }
}
