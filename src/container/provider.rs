//! Provider wrapper: adapts a typed constructor into a uniform callable with
//! declared argument keys and a declared result key.
//!
//! Constructor signatures are turned into registration metadata statically by
//! the [`ProviderFn`] / [`TryProviderFn`] impls (generated for arities 0..=8):
//! a provider is a `Fn(Arc<A1>, .., Arc<An>) -> T`, or, for the fallible form,
//! `-> Result<T, E>` where `E: std::error::Error` is the failure channel. The
//! same validation rules (output arity 1 or 2, second output must be a failure
//! channel) are enforced dynamically by [`ProviderWrapper::from_parts`] so
//! wrappers built from hand-written metadata go through the identical checks.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::container::key::BindingKey;
use crate::errors::{BoxError, CoreError};

/// Erased argument handed to a constructor: a `Box<dyn Any>` holding the
/// `Arc<A>` view the consumer declared (concrete type or capability trait).
pub type ErasedArg = Box<dyn Any + Send + Sync>;

/// Erased memoized instance: the constructed value behind `Arc`.
pub type ErasedInstance = Arc<dyn Any + Send + Sync>;

/// Erased constructor function stored inside a provider wrapper.
pub type ConstructorFn =
    Box<dyn Fn(Vec<ErasedArg>) -> Result<ErasedInstance, BoxError> + Send + Sync>;

/// Kind of provider backing a binding.
///
/// `Value` (constructing from a literal rather than a callable) is declared
/// but intentionally unimplemented; any attempt to construct one fails with
/// [`CoreError::UnimplementedProviderKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Callable,
    Value,
}

/// Declared output signature of a constructor or modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSignature {
    /// Number of declared outputs.
    pub arity: usize,
    /// Whether the trailing output is a failure channel (an error type).
    pub failure_is_error: bool,
}

/// Uniform wrapper around a registered constructor.
///
/// Immutable after construction; building one only inspects signature
/// metadata and never invokes the constructor.
pub struct ProviderWrapper {
    kind: ProviderKind,
    result: BindingKey,
    arguments: Vec<BindingKey>,
    constructor: ConstructorFn,
}

impl ProviderWrapper {
    /// Build a wrapper from signature metadata, validating the output shape.
    ///
    /// The output arity must be 1 (a value) or 2 (a value plus a failure
    /// channel); a two-output constructor whose second output is not an error
    /// is rejected with [`CoreError::InvalidProviderSignature`].
    pub fn from_parts(
        kind: ProviderKind,
        result: BindingKey,
        arguments: Vec<BindingKey>,
        outputs: OutputSignature,
        constructor: ConstructorFn,
    ) -> Result<Self, CoreError> {
        if kind == ProviderKind::Value {
            return Err(CoreError::UnimplementedProviderKind);
        }

        if outputs.arity == 0 || outputs.arity > 2 {
            return Err(CoreError::invalid_provider_signature(
                "constructor must declare a value and an optional error as outputs",
            ));
        }

        if outputs.arity == 2 && !outputs.failure_is_error {
            return Err(CoreError::invalid_provider_signature(
                "second constructor output must be an error",
            ));
        }

        Ok(Self {
            kind,
            result,
            arguments,
            constructor,
        })
    }

    /// The literal/value provider variant. Permanently unimplemented.
    pub fn value() -> Result<Self, CoreError> {
        Err(CoreError::UnimplementedProviderKind)
    }

    /// Kind of this provider
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Key of the constructed result
    pub fn result(&self) -> &BindingKey {
        &self.result
    }

    /// Declared argument keys, in positional order
    pub fn arguments(&self) -> &[BindingKey] {
        &self.arguments
    }

    /// Invoke the underlying constructor with resolved arguments.
    pub(crate) fn invoke(&self, args: Vec<ErasedArg>) -> Result<ErasedInstance, BoxError> {
        (self.constructor)(args)
    }
}

impl fmt::Debug for ProviderWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderWrapper")
            .field("kind", &self.kind)
            .field("result", &self.result)
            .field("arguments", &self.arguments)
            .field("constructor", &"<constructor_fn>")
            .finish()
    }
}

/// Infallible constructor: `Fn(Arc<A1>, .., Arc<An>) -> T`.
pub trait ProviderFn<Args>: Send + Sync + 'static {
    /// The constructed type
    type Output: Send + Sync + 'static;

    /// Wrap this constructor into a [`ProviderWrapper`]
    fn into_provider(self) -> Result<ProviderWrapper, CoreError>;
}

/// Fallible constructor: `Fn(Arc<A1>, .., Arc<An>) -> Result<T, E>` where
/// `E: std::error::Error + Send + Sync` is the failure channel.
pub trait TryProviderFn<Args>: Send + Sync + 'static {
    /// The constructed type
    type Output: Send + Sync + 'static;

    /// Wrap this constructor into a [`ProviderWrapper`]
    fn into_provider(self) -> Result<ProviderWrapper, CoreError>;
}

/// Pull the next positional argument out of the erased argument list.
pub(crate) fn take_arg<A: ?Sized + Send + Sync + 'static>(
    args: &mut std::vec::IntoIter<ErasedArg>,
) -> Result<Arc<A>, BoxError> {
    let erased = args
        .next()
        .ok_or_else(|| argument_error::<A>("missing positional argument"))?;
    match erased.downcast::<Arc<A>>() {
        Ok(arg) => Ok(*arg),
        Err(_) => Err(argument_error::<A>("argument does not match declared type")),
    }
}

fn argument_error<A: ?Sized + 'static>(message: &str) -> BoxError {
    Box::new(CoreError::resolution_failed(
        std::any::type_name::<A>(),
        message,
    ))
}

impl<F, T> ProviderFn<()> for F
where
    F: Fn() -> T + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    type Output = T;

    fn into_provider(self) -> Result<ProviderWrapper, CoreError> {
        let constructor: ConstructorFn =
            Box::new(move |_args| Ok(Arc::new((self)()) as ErasedInstance));
        ProviderWrapper::from_parts(
            ProviderKind::Callable,
            BindingKey::of::<T>(),
            Vec::new(),
            OutputSignature {
                arity: 1,
                failure_is_error: false,
            },
            constructor,
        )
    }
}

impl<F, T, E> TryProviderFn<()> for F
where
    F: Fn() -> Result<T, E> + Send + Sync + 'static,
    T: Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    type Output = T;

    fn into_provider(self) -> Result<ProviderWrapper, CoreError> {
        let constructor: ConstructorFn = Box::new(move |_args| match (self)() {
            Ok(value) => Ok(Arc::new(value) as ErasedInstance),
            Err(err) => Err(Box::new(err) as BoxError),
        });
        ProviderWrapper::from_parts(
            ProviderKind::Callable,
            BindingKey::of::<T>(),
            Vec::new(),
            OutputSignature {
                arity: 2,
                failure_is_error: true,
            },
            constructor,
        )
    }
}

macro_rules! impl_provider_fn {
    ($(($ty:ident, $var:ident)),+) => {
        impl<F, T, $($ty),+> ProviderFn<($(Arc<$ty>,)+)> for F
        where
            F: Fn($(Arc<$ty>),+) -> T + Send + Sync + 'static,
            T: Send + Sync + 'static,
            $($ty: ?Sized + Send + Sync + 'static,)+
        {
            type Output = T;

            fn into_provider(self) -> Result<ProviderWrapper, CoreError> {
                let arguments = vec![$(BindingKey::of::<$ty>()),+];
                let constructor: ConstructorFn = Box::new(move |args| {
                    let mut args = args.into_iter();
                    $(let $var = take_arg::<$ty>(&mut args)?;)+
                    Ok(Arc::new((self)($($var),+)) as ErasedInstance)
                });
                ProviderWrapper::from_parts(
                    ProviderKind::Callable,
                    BindingKey::of::<T>(),
                    arguments,
                    OutputSignature { arity: 1, failure_is_error: false },
                    constructor,
                )
            }
        }

        impl<F, T, E, $($ty),+> TryProviderFn<($(Arc<$ty>,)+)> for F
        where
            F: Fn($(Arc<$ty>),+) -> Result<T, E> + Send + Sync + 'static,
            T: Send + Sync + 'static,
            E: std::error::Error + Send + Sync + 'static,
            $($ty: ?Sized + Send + Sync + 'static,)+
        {
            type Output = T;

            fn into_provider(self) -> Result<ProviderWrapper, CoreError> {
                let arguments = vec![$(BindingKey::of::<$ty>()),+];
                let constructor: ConstructorFn = Box::new(move |args| {
                    let mut args = args.into_iter();
                    $(let $var = take_arg::<$ty>(&mut args)?;)+
                    match (self)($($var),+) {
                        Ok(value) => Ok(Arc::new(value) as ErasedInstance),
                        Err(err) => Err(Box::new(err) as BoxError),
                    }
                });
                ProviderWrapper::from_parts(
                    ProviderKind::Callable,
                    BindingKey::of::<T>(),
                    arguments,
                    OutputSignature { arity: 2, failure_is_error: true },
                    constructor,
                )
            }
        }
    };
}

impl_provider_fn!((A1, a1));
impl_provider_fn!((A1, a1), (A2, a2));
impl_provider_fn!((A1, a1), (A2, a2), (A3, a3));
impl_provider_fn!((A1, a1), (A2, a2), (A3, a3), (A4, a4));
impl_provider_fn!((A1, a1), (A2, a2), (A3, a3), (A4, a4), (A5, a5));
impl_provider_fn!((A1, a1), (A2, a2), (A3, a3), (A4, a4), (A5, a5), (A6, a6));
impl_provider_fn!(
    (A1, a1),
    (A2, a2),
    (A3, a3),
    (A4, a4),
    (A5, a5),
    (A6, a6),
    (A7, a7)
);
impl_provider_fn!(
    (A1, a1),
    (A2, a2),
    (A3, a3),
    (A4, a4),
    (A5, a5),
    (A6, a6),
    (A7, a7),
    (A8, a8)
);
