//! Registry of compiled definitions, indexed by exact key and by capability.

use std::collections::HashMap;

use crate::container::definition::Definition;
use crate::container::key::BindingKey;
use crate::errors::CoreError;

/// Owns every [`Definition`] for the lifetime of the container.
///
/// Keys are kept in registration order so wiring, cycle detection and error
/// reporting are deterministic across runs with the same registrations.
#[derive(Debug, Default)]
pub struct DefinitionStorage {
    keys: Vec<BindingKey>,
    definitions: HashMap<BindingKey, Definition>,
    capabilities: HashMap<BindingKey, Vec<BindingKey>>,
}

impl DefinitionStorage {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a definition under its exact key and every capability key it
    /// claims. Registering the same exact key twice is a conflict; the check
    /// happens before any mutation.
    pub(crate) fn add(&mut self, definition: Definition) -> Result<(), CoreError> {
        let key = definition.key().clone();
        if self.definitions.contains_key(&key) {
            return Err(CoreError::duplicate_binding(key.to_string()));
        }

        self.keys.push(key.clone());
        for capability in definition.capabilities() {
            self.capabilities
                .entry(capability.clone())
                .or_default()
                .push(key.clone());
        }
        self.definitions.insert(key, definition);

        Ok(())
    }

    /// Two-tier lookup: exact binding first, then the first-registered
    /// claimant of the capability. Later claimants are retained but shadowed
    /// for default lookup.
    pub(crate) fn get(&self, key: &BindingKey) -> Result<&Definition, CoreError> {
        if let Some(definition) = self.definitions.get(key) {
            return Ok(definition);
        }

        if let Some(claimant) = self
            .capabilities
            .get(key)
            .and_then(|claimants| claimants.first())
        {
            return self.get_exact(claimant);
        }

        Err(CoreError::binding_not_found(key.to_string()))
    }

    /// Exact-key lookup for keys known to name a definition.
    pub(crate) fn get_exact(&self, key: &BindingKey) -> Result<&Definition, CoreError> {
        self.definitions
            .get(key)
            .ok_or_else(|| CoreError::resolution_failed(key.to_string(), "definition missing"))
    }

    pub(crate) fn get_exact_mut(&mut self, key: &BindingKey) -> Result<&mut Definition, CoreError> {
        self.definitions
            .get_mut(key)
            .ok_or_else(|| CoreError::resolution_failed(key.to_string(), "definition missing"))
    }

    /// All exact keys in registration order.
    pub(crate) fn all_keys(&self) -> &[BindingKey] {
        &self.keys
    }

    /// Number of registered definitions.
    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }
}
