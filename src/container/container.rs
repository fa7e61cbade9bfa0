//! Compiled container: graph construction, validation and lazy resolution.
//!
//! Compilation is all-or-nothing and runs in four phases: register every
//! provider, wire declared arguments to their supplying definitions, verify
//! the wired graph is acyclic, then apply modifiers in registration order.
//! Any failure aborts the whole pipeline and no container is produced.
//!
//! Instantiation is lazy and memoized: nothing is constructed until first
//! requested, and a successful construction is cached for the container's
//! lifetime. Failed constructions are not cached.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use tracing::{debug, trace};

use crate::container::builder::ContainerBuilder;
use crate::container::definition::{Definition, DependencyEdge, SlotAssignFn};
use crate::container::graph;
use crate::container::key::BindingKey;
use crate::container::provider::{ErasedArg, ErasedInstance};
use crate::container::storage::DefinitionStorage;
use crate::errors::CoreError;

/// Populate target registered for a binding: the definition that fills the
/// slot and the adapter that writes into the erased `Option<Arc<T>>`.
struct SlotBinding {
    definition: BindingKey,
    assign: SlotAssignFn,
}

/// A compiled, ready-to-resolve dependency container.
///
/// Immutable after compilation apart from the memoization cache, so it is
/// safe to share behind `Arc` and resolve from multiple threads.
pub struct Container {
    storage: DefinitionStorage,
    slots: HashMap<TypeId, SlotBinding>,
    instances: RwLock<HashMap<BindingKey, ErasedInstance>>,
}

impl Container {
    /// Run the compile pipeline over the builder's registrations.
    pub(crate) fn compile(builder: ContainerBuilder) -> Result<Self, CoreError> {
        debug!(
            providers = builder.providers.len(),
            modifiers = builder.modifiers.len(),
            "compiling container"
        );

        let mut storage = DefinitionStorage::new();
        let mut slots: HashMap<TypeId, SlotBinding> = HashMap::new();

        // Phase 1: register definitions, reporting conflicts and invalid
        // signatures before any wiring happens.
        for registration in builder.providers {
            let provider = registration.source?;
            let key = match &registration.name {
                Some(name) => provider.result().with_name(name.clone()),
                None => provider.result().clone(),
            };

            let mut casters = HashMap::new();
            casters.insert(key.clone(), registration.self_caster.clone());

            let mut capabilities = Vec::with_capacity(registration.capabilities.len());
            for claim in &registration.capabilities {
                capabilities.push(claim.key.clone());
                casters.insert(claim.key.clone(), claim.caster.clone());
            }

            storage.add(Definition::new(key.clone(), capabilities, provider, casters))?;

            // Named bindings are reachable only through name-aware lookup;
            // erased populate targets map to the unqualified binding.
            if registration.name.is_none() {
                slots
                    .entry(registration.self_slot_type)
                    .or_insert_with(|| SlotBinding {
                        definition: key.clone(),
                        assign: registration.self_assign.clone(),
                    });
            }
            for claim in registration.capabilities {
                slots.entry(claim.slot_type).or_insert_with(|| SlotBinding {
                    definition: key.clone(),
                    assign: claim.assign,
                });
            }
        }

        // Phase 2: wire every declared argument to the definition supplying
        // it. A declared key with no exact binding and no capability claimant
        // fails compilation here.
        let keys: Vec<BindingKey> = storage.all_keys().to_vec();
        for key in &keys {
            let declared = storage.get_exact(key)?.provider().arguments().to_vec();
            for argument in declared {
                let supplier = storage.get(&argument)?.key().clone();
                trace!(consumer = %key, declared = %argument, supplier = %supplier, "wired dependency");
                storage.get_exact_mut(key)?.push_dependency(DependencyEdge {
                    declared: argument,
                    definition: supplier.clone(),
                });
                storage.get_exact_mut(&supplier)?.push_dependent(key.clone());
            }
        }

        // Phase 3: the wired graph must be acyclic before anything runs.
        graph::detect_cycles(&storage)?;

        let container = Self {
            storage,
            slots,
            instances: RwLock::new(HashMap::new()),
        };

        // Phase 4: modifiers run in registration order with container-resolved
        // arguments; the first failure aborts compilation.
        for (index, registration) in builder.modifiers.into_iter().enumerate() {
            let modifier = registration.source?;
            let mut args = Vec::with_capacity(modifier.arguments().len());
            for declared in modifier.arguments() {
                args.push(container.erased_argument(declared)?);
            }
            modifier
                .invoke(args)
                .map_err(|source| CoreError::ModifierFailed { index, source })?;
        }

        debug!(bindings = container.storage.len(), "container compiled");
        Ok(container)
    }

    /// Resolve the binding for `T`: the exact unqualified binding, or the
    /// first-registered claimant when `T` is a claimed capability.
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, CoreError> {
        self.resolve_key(&BindingKey::of::<T>())
    }

    /// Resolve the binding registered for `T` under `name`.
    pub fn resolve_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Arc<T>, CoreError> {
        self.resolve_key(&BindingKey::named::<T>(name))
    }

    /// Write the resolved binding for `T` into the target slot.
    pub fn populate<T: ?Sized + Send + Sync + 'static>(
        &self,
        target: &mut Option<Arc<T>>,
    ) -> Result<(), CoreError> {
        *target = Some(self.resolve::<T>()?);
        Ok(())
    }

    /// Write the named binding for `T` into the target slot.
    pub fn populate_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
        target: &mut Option<Arc<T>>,
    ) -> Result<(), CoreError> {
        *target = Some(self.resolve_named::<T>(name)?);
        Ok(())
    }

    /// Type-erased populate: the target must be an `Option<Arc<T>>` slot for
    /// some registered binding or claimed capability. An unrecognized target
    /// fails with [`CoreError::InvalidPopulateTarget`] and is left untouched.
    pub fn populate_any(&self, target: &mut dyn Any) -> Result<(), CoreError> {
        let slot_type = (*target).type_id();
        let slot = self.slots.get(&slot_type).ok_or_else(|| {
            CoreError::invalid_populate_target(
                "target is not an Option<Arc<T>> slot for any registered binding",
            )
        })?;

        let instance = self.instance_of(&slot.definition)?;
        if (slot.assign)(&instance, target) {
            Ok(())
        } else {
            Err(CoreError::invalid_populate_target(
                "resolved instance does not fit the target slot",
            ))
        }
    }

    /// Whether a binding (exact or claimed capability) exists for `T`.
    pub fn contains<T: ?Sized + Send + Sync + 'static>(&self) -> bool {
        self.storage.get(&BindingKey::of::<T>()).is_ok()
    }

    /// Whether a binding exists for `T` under `name`.
    pub fn contains_named<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> bool {
        self.storage.get(&BindingKey::named::<T>(name)).is_ok()
    }

    /// Number of registered bindings.
    pub fn binding_count(&self) -> usize {
        self.storage.len()
    }

    fn resolve_key<T: ?Sized + Send + Sync + 'static>(
        &self,
        key: &BindingKey,
    ) -> Result<Arc<T>, CoreError> {
        let definition = self.storage.get(key)?;
        let definition_key = definition.key().clone();
        let caster = definition.caster_for(key).ok_or_else(|| {
            CoreError::resolution_failed(key.to_string(), "no view registered for requested key")
        })?;

        let instance = self.instance_of(&definition_key)?;
        let erased = caster(instance).ok_or_else(|| {
            CoreError::resolution_failed(
                key.to_string(),
                "memoized instance does not match requested key",
            )
        })?;
        erased
            .downcast::<Arc<T>>()
            .map(|arc| *arc)
            .map_err(|_| {
                CoreError::resolution_failed(
                    key.to_string(),
                    "requested type does not match the registered view",
                )
            })
    }

    /// Memoized instance for an exact definition key, constructing on first
    /// request. The per-definition build guard plus the double cache check
    /// make construction at-most-once under concurrent resolution; guards are
    /// only ever taken in dependency order, which the acyclicity check proved
    /// free of cycles, so this cannot deadlock.
    fn instance_of(&self, key: &BindingKey) -> Result<ErasedInstance, CoreError> {
        if let Some(instance) = self.cached(key)? {
            return Ok(instance);
        }

        let definition = self.storage.get_exact(key)?;
        let _guard = definition
            .build_guard()
            .lock()
            .map_err(|_| CoreError::lock(key.to_string()))?;

        if let Some(instance) = self.cached(key)? {
            return Ok(instance);
        }

        let mut args = Vec::with_capacity(definition.dependencies().len());
        for edge in definition.dependencies() {
            args.push(self.wired_argument(edge)?);
        }

        trace!(binding = %key, "constructing instance");
        let instance = definition
            .provider()
            .invoke(args)
            .map_err(|source| CoreError::ConstructionFailed {
                binding: key.to_string(),
                source,
            })?;

        self.instances
            .write()
            .map_err(|_| CoreError::lock("instance cache"))?
            .insert(key.clone(), instance.clone());

        Ok(instance)
    }

    /// Resolve a wired dependency edge into the erased argument view the
    /// consumer declared.
    fn wired_argument(&self, edge: &DependencyEdge) -> Result<ErasedArg, CoreError> {
        let supplier = self.storage.get_exact(&edge.definition)?;
        let caster = supplier.caster_for(&edge.declared).ok_or_else(|| {
            CoreError::resolution_failed(
                edge.declared.to_string(),
                "no view registered for declared key",
            )
        })?;

        let instance = self.instance_of(&edge.definition)?;
        caster(instance).ok_or_else(|| {
            CoreError::resolution_failed(
                edge.declared.to_string(),
                "memoized instance does not match declared key",
            )
        })
    }

    /// Resolve a declared key (exact or capability) into an erased argument,
    /// used for modifier arguments which are not pre-wired.
    fn erased_argument(&self, declared: &BindingKey) -> Result<ErasedArg, CoreError> {
        let supplier = self.storage.get(declared)?.key().clone();
        self.wired_argument(&DependencyEdge {
            declared: declared.clone(),
            definition: supplier,
        })
    }

    fn cached(&self, key: &BindingKey) -> Result<Option<ErasedInstance>, CoreError> {
        Ok(self
            .instances
            .read()
            .map_err(|_| CoreError::lock("instance cache"))?
            .get(key)
            .cloned())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self.instances.read().map(|map| map.len()).unwrap_or(0);
        f.debug_struct("Container")
            .field("bindings", &self.storage.len())
            .field("slots", &self.slots.len())
            .field("cached_instances", &cached)
            .finish()
    }
}
