//! Dependency-injection container.
//!
//! The lifecycle has two states. A [`ContainerBuilder`] accumulates provider
//! and modifier registrations; [`ContainerBuilder::build`] compiles them into
//! an immutable [`Container`] after wiring and validating the dependency
//! graph. Resolution is lazy: instances are constructed on first request and
//! memoized for the container's lifetime.

pub mod builder;
pub mod container;
pub mod definition;
pub(crate) mod graph;
pub mod key;
pub mod modifier;
pub mod provider;
pub mod storage;

pub use builder::{ContainerBuilder, ProviderBinding};
pub use container::Container;
pub use definition::{Definition, DependencyEdge, InstanceCaster, SlotAssignFn};
pub use key::BindingKey;
pub use modifier::{ActionFn, ModifierFn, ModifierWrapper, TryModifierFn};
pub use provider::{
    ConstructorFn, ErasedArg, ErasedInstance, OutputSignature, ProviderFn, ProviderKind,
    ProviderWrapper, TryProviderFn,
};
pub use storage::DefinitionStorage;
