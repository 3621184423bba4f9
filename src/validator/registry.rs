//! Validator registry.
//!
//! Holds one entry per registered validator, in registration order. The
//! order is a documented contract: the modification pass and every
//! lifecycle phase walk the registry in exactly this order.

use crate::core::error::ContractViolation;
use crate::core::types::ValidatorConfig;
use crate::validator::contract::{ConcurrencyMode, StageValidator, SubtreeTarget};
use indexmap::IndexMap;
use std::sync::Arc;

/// One registered validator.
pub struct ValidatorRegistration {
    /// Validator name, unique within a run.
    pub name: String,
    /// The contract implementation.
    pub validator: Arc<dyn StageValidator>,
    /// Declared scheduling mode.
    pub mode: ConcurrencyMode,
    /// Validator-defined options, opaque to the engine.
    pub config: ValidatorConfig,
    /// Subtree the validator is registered against.
    pub target: SubtreeTarget,
}

impl std::fmt::Debug for ValidatorRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorRegistration")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("target", &self.target)
            .field("config", &self.config)
            .finish()
    }
}

impl ValidatorRegistration {
    /// Register a validator against the whole tree with default options.
    pub fn new(validator: Arc<dyn StageValidator>) -> Self {
        Self {
            name: validator.name().to_string(),
            validator,
            mode: ConcurrencyMode::default(),
            config: ValidatorConfig::new(),
            target: SubtreeTarget::Root,
        }
    }

    /// Set the scheduling mode.
    pub fn with_mode(mut self, mode: ConcurrencyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the validator-defined configuration record.
    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Register against a named subtree instead of the whole tree.
    pub fn with_target(mut self, target: SubtreeTarget) -> Self {
        self.target = target;
        self
    }
}

/// Registry of validators for one orchestration run.
pub struct ValidatorRegistry {
    entries: IndexMap<String, Arc<ValidatorRegistration>>,
}

impl ValidatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Register a validator.
    ///
    /// Names must be unique within a run; a collision is a
    /// [`ContractViolation::DuplicateName`].
    pub fn register(
        &mut self,
        registration: ValidatorRegistration,
    ) -> Result<(), ContractViolation> {
        let name = registration.name.clone();
        if self.entries.contains_key(&name) {
            return Err(ContractViolation::DuplicateName(name));
        }
        self.entries.insert(name, Arc::new(registration));
        Ok(())
    }

    /// Get a registration by name.
    pub fn get(&self, name: &str) -> Option<&Arc<ValidatorRegistration>> {
        self.entries.get(name)
    }

    /// Check if a validator is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterate registrations in registration order.
    pub fn registrations(&self) -> impl Iterator<Item = &Arc<ValidatorRegistration>> {
        self.entries.values()
    }

    /// Number of registered validators.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
