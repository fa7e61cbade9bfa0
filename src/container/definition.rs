//! Compiled graph node for one binding.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::container::key::BindingKey;
use crate::container::provider::{ErasedArg, ErasedInstance, ProviderWrapper};

/// Converts the memoized erased instance into the erased `Arc<A>` view a
/// consumer declared: the definition's own concrete type, or one of the
/// capability traits it claims. Returns `None` on a type mismatch.
///
/// This replaces runtime interface-satisfaction checks: the unsize coercion
/// `Arc<T> -> Arc<dyn Capability>` is captured at registration time, where
/// both sides are concrete types.
pub type InstanceCaster = Arc<dyn Fn(ErasedInstance) -> Option<ErasedArg> + Send + Sync>;

/// Writes a resolved instance into a caller-supplied `Option<Arc<T>>` slot.
/// Returns false when the instance or the target does not match.
pub type SlotAssignFn = Arc<dyn Fn(&ErasedInstance, &mut dyn std::any::Any) -> bool + Send + Sync>;

/// A wired dependency edge: the key the consumer declared (possibly a
/// capability) and the key of the definition that satisfies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub declared: BindingKey,
    pub definition: BindingKey,
}

/// The compiled unit representing one binding: its key, the capabilities it
/// additionally satisfies, its provider, and its graph edges.
///
/// Edge lists are mutated only during the wiring phase of compilation and are
/// read-only afterwards. The memoized instance lives in the container's cache;
/// `build_guard` serializes first construction so a binding is constructed at
/// most once even under concurrent resolution.
pub struct Definition {
    key: BindingKey,
    capabilities: Vec<BindingKey>,
    provider: ProviderWrapper,
    dependencies: Vec<DependencyEdge>,
    dependents: Vec<BindingKey>,
    casters: HashMap<BindingKey, InstanceCaster>,
    build_guard: Mutex<()>,
}

impl Definition {
    pub(crate) fn new(
        key: BindingKey,
        capabilities: Vec<BindingKey>,
        provider: ProviderWrapper,
        casters: HashMap<BindingKey, InstanceCaster>,
    ) -> Self {
        Self {
            key,
            capabilities,
            provider,
            dependencies: Vec::new(),
            dependents: Vec::new(),
            casters,
            build_guard: Mutex::new(()),
        }
    }

    /// Exact key this definition is bound under
    pub fn key(&self) -> &BindingKey {
        &self.key
    }

    /// Capability keys this definition additionally satisfies
    pub fn capabilities(&self) -> &[BindingKey] {
        &self.capabilities
    }

    /// The wrapped provider
    pub fn provider(&self) -> &ProviderWrapper {
        &self.provider
    }

    /// Incoming argument edges, in declared order (wired during compilation)
    pub fn dependencies(&self) -> &[DependencyEdge] {
        &self.dependencies
    }

    /// Keys of definitions that depend on this one (wired during compilation)
    pub fn dependents(&self) -> &[BindingKey] {
        &self.dependents
    }

    /// Caster for one of the keys this definition answers to.
    pub(crate) fn caster_for(&self, key: &BindingKey) -> Option<InstanceCaster> {
        self.casters.get(key).cloned()
    }

    pub(crate) fn push_dependency(&mut self, edge: DependencyEdge) {
        self.dependencies.push(edge);
    }

    pub(crate) fn push_dependent(&mut self, key: BindingKey) {
        self.dependents.push(key);
    }

    pub(crate) fn build_guard(&self) -> &Mutex<()> {
        &self.build_guard
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("key", &self.key)
            .field("capabilities", &self.capabilities)
            .field("provider", &self.provider)
            .field("dependencies", &self.dependencies)
            .field("dependents", &self.dependents)
            .finish()
    }
}
