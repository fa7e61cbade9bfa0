//! Registration surface consumed by container compilation.
//!
//! The builder is the "configuring" state of the container: it accepts
//! ordered provider and modifier registrations and is consumed by
//! [`ContainerBuilder::build`], so no registration can happen after
//! compilation.
//!
//! ```
//! use std::sync::Arc;
//! use wirebox::ContainerBuilder;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct English;
//! impl Greeter for English {
//!     fn greet(&self) -> String {
//!         "hello".into()
//!     }
//! }
//!
//! # fn main() -> Result<(), wirebox::CoreError> {
//! let mut builder = ContainerBuilder::new();
//! builder
//!     .provide(|| English)
//!     .implements(|greeter: Arc<English>| greeter as Arc<dyn Greeter>);
//!
//! let container = builder.build()?;
//! assert_eq!(container.resolve::<dyn Greeter>()?.greet(), "hello");
//! # Ok(())
//! # }
//! ```

use std::any::TypeId;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::container::container::Container;
use crate::container::definition::{InstanceCaster, SlotAssignFn};
use crate::container::key::BindingKey;
use crate::container::modifier::{ModifierFn, ModifierWrapper, TryModifierFn};
use crate::container::provider::{ErasedArg, ErasedInstance, ProviderFn, ProviderWrapper, TryProviderFn};
use crate::errors::CoreError;

/// A capability a registration opts into: the capability key, the caster
/// producing the `Arc<dyn Capability>` view, and the populate-slot adapter
/// for `Option<Arc<dyn Capability>>` targets.
pub(crate) struct CapabilityClaim {
    pub(crate) key: BindingKey,
    pub(crate) caster: InstanceCaster,
    pub(crate) slot_type: TypeId,
    pub(crate) assign: SlotAssignFn,
}

/// One pending provider registration.
pub(crate) struct ProviderRegistration {
    pub(crate) source: Result<ProviderWrapper, CoreError>,
    pub(crate) name: Option<String>,
    pub(crate) capabilities: Vec<CapabilityClaim>,
    pub(crate) self_caster: InstanceCaster,
    pub(crate) self_slot_type: TypeId,
    pub(crate) self_assign: SlotAssignFn,
}

impl ProviderRegistration {
    fn new<T: Send + Sync + 'static>(source: Result<ProviderWrapper, CoreError>) -> Self {
        let self_caster: InstanceCaster = Arc::new(|instance: ErasedInstance| {
            instance
                .downcast::<T>()
                .ok()
                .map(|concrete| Box::new(concrete) as ErasedArg)
        });

        let self_assign: SlotAssignFn = Arc::new(|instance, target| {
            match (
                instance.clone().downcast::<T>(),
                target.downcast_mut::<Option<Arc<T>>>(),
            ) {
                (Ok(concrete), Some(slot)) => {
                    *slot = Some(concrete);
                    true
                }
                _ => false,
            }
        });

        Self {
            source,
            name: None,
            capabilities: Vec::new(),
            self_caster,
            self_slot_type: TypeId::of::<Option<Arc<T>>>(),
            self_assign,
        }
    }
}

/// One pending modifier registration.
pub(crate) struct ModifierRegistration {
    pub(crate) source: Result<ModifierWrapper, CoreError>,
}

/// Fluent handle for qualifying the registration just added.
pub struct ProviderBinding<'a, T> {
    registration: &'a mut ProviderRegistration,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Send + Sync + 'static> ProviderBinding<'a, T> {
    /// Qualify this binding with a name, so it is registered under
    /// `BindingKey::named::<T>(name)` instead of the bare type key.
    pub fn named(self, name: impl Into<String>) -> Self {
        self.registration.name = Some(name.into());
        self
    }

    /// Declare that this binding also satisfies capability `C`.
    ///
    /// The cast captures the `Arc<T> -> Arc<C>` coercion at the call site,
    /// where both types are known:
    ///
    /// `.implements(|svc: Arc<PgStore>| svc as Arc<dyn Storage>)`
    ///
    /// When several bindings claim the same capability, unqualified lookup
    /// returns the first registered one.
    pub fn implements<C>(self, cast: fn(Arc<T>) -> Arc<C>) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let caster: InstanceCaster = Arc::new(move |instance: ErasedInstance| {
            instance
                .downcast::<T>()
                .ok()
                .map(|concrete| Box::new(cast(concrete)) as ErasedArg)
        });

        let assign: SlotAssignFn = Arc::new(move |instance, target| {
            match (
                instance.clone().downcast::<T>(),
                target.downcast_mut::<Option<Arc<C>>>(),
            ) {
                (Ok(concrete), Some(slot)) => {
                    *slot = Some(cast(concrete));
                    true
                }
                _ => false,
            }
        });

        self.registration.capabilities.push(CapabilityClaim {
            key: BindingKey::of::<C>(),
            caster,
            slot_type: TypeId::of::<Option<Arc<C>>>(),
            assign,
        });
        self
    }
}

/// Accumulates provider and modifier registrations, then compiles them into
/// a [`Container`] in one shot.
#[derive(Default)]
pub struct ContainerBuilder {
    pub(crate) providers: Vec<ProviderRegistration>,
    pub(crate) modifiers: Vec<ModifierRegistration>,
}

impl ContainerBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an infallible constructor: `Fn(Arc<A1>, .., Arc<An>) -> T`.
    pub fn provide<F, Args>(&mut self, constructor: F) -> ProviderBinding<'_, F::Output>
    where
        F: ProviderFn<Args>,
    {
        self.push_registration(ProviderRegistration::new::<F::Output>(
            constructor.into_provider(),
        ))
    }

    /// Register a fallible constructor: `Fn(Arc<A1>, .., Arc<An>) ->
    /// Result<T, E>`. A non-empty failure output at instantiation time
    /// surfaces as [`CoreError::ConstructionFailed`].
    pub fn try_provide<F, Args>(&mut self, constructor: F) -> ProviderBinding<'_, F::Output>
    where
        F: TryProviderFn<Args>,
    {
        self.push_registration(ProviderRegistration::new::<F::Output>(
            constructor.into_provider(),
        ))
    }

    /// Register a literal value binding.
    ///
    /// Value providers are a declared capability gap: compilation always
    /// fails with [`CoreError::UnimplementedProviderKind`].
    pub fn provide_value<T: Send + Sync + 'static>(&mut self, _value: T) -> &mut Self {
        self.providers
            .push(ProviderRegistration::new::<T>(ProviderWrapper::value()));
        self
    }

    /// Register a post-wiring modifier: `Fn(Arc<A1>, .., Arc<An>)`. Modifiers
    /// run in registration order after the graph is validated.
    pub fn modify<F, Args>(&mut self, modifier: F) -> &mut Self
    where
        F: ModifierFn<Args>,
    {
        self.modifiers.push(ModifierRegistration {
            source: modifier.into_modifier(),
        });
        self
    }

    /// Register a fallible modifier: `Fn(Arc<A1>, .., Arc<An>) ->
    /// Result<(), E>`. A returned failure aborts compilation.
    pub fn try_modify<F, Args>(&mut self, modifier: F) -> &mut Self
    where
        F: TryModifierFn<Args>,
    {
        self.modifiers.push(ModifierRegistration {
            source: modifier.into_modifier(),
        });
        self
    }

    /// Compile the registrations into a ready container.
    ///
    /// All-or-nothing: the first conflict, missing dependency, invalid
    /// signature, cycle or modifier failure aborts the whole pipeline.
    pub fn build(self) -> Result<Container, CoreError> {
        Container::compile(self)
    }

    fn push_registration<T>(
        &mut self,
        registration: ProviderRegistration,
    ) -> ProviderBinding<'_, T> {
        let index = self.providers.len();
        self.providers.push(registration);
        ProviderBinding {
            registration: &mut self.providers[index],
            _marker: PhantomData,
        }
    }
}
