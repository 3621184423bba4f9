//! Stage node model.
//!
//! A [`BuiltStage`] is a read-only snapshot of one node in a deployed
//! pipeline tree: an identifier, an opaque kind tag interpreted by
//! stage-specific collaborators, an ordered child list encoding data-flow
//! order, and an optional parent back-reference for lookup.

use crate::core::error::StageId;
use serde::{Deserialize, Serialize};

/// Where a stage came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum StageOrigin {
    /// Created by the external deployment builder before orchestration.
    Deployed,
    /// Injected by a validator during the subtree modification pass.
    ///
    /// `owner` is the name of the registering validator, set at insertion
    /// and immutable thereafter. Only the engine removes injected nodes,
    /// and only on behalf of their owning validator.
    Injected { owner: String },
}

impl StageOrigin {
    /// Whether this stage was injected by a validator.
    pub fn is_injected(&self) -> bool {
        matches!(self, StageOrigin::Injected { .. })
    }

    /// The owning validator's name, for injected stages.
    pub fn owner(&self) -> Option<&str> {
        match self {
            StageOrigin::Injected { owner } => Some(owner),
            StageOrigin::Deployed => None,
        }
    }
}

/// Snapshot of a single stage in the tree.
///
/// Snapshots are cheap, owned copies: validators read the tree through
/// them instead of holding references into shared storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltStage {
    /// Unique identifier.
    pub id: StageId,
    /// Opaque stage kind tag (e.g. "ingestion", "transform", "egress").
    pub kind: String,
    /// Parent stage, if any. The root has none.
    pub parent: Option<StageId>,
    /// Ordered children. Order encodes pipeline data-flow order.
    pub children: Vec<StageId>,
    /// Deployed by the builder or injected by a validator.
    pub origin: StageOrigin,
}

impl BuiltStage {
    /// Whether this stage was injected by a validator.
    pub fn is_injected(&self) -> bool {
        self.origin.is_injected()
    }

    /// Whether this stage is the tree root.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
