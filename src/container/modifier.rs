//! Modifier wrapper: a post-wiring function invoked with container-resolved
//! arguments once the graph is validated, used for side-effecting setup.
//!
//! A modifier declares zero or more argument types and either no output or a
//! single failure channel: `Fn(Arc<A1>, .., Arc<An>)` or
//! `Fn(Arc<A1>, .., Arc<An>) -> Result<(), E>` with `E: std::error::Error`.

use std::fmt;
use std::sync::Arc;

use crate::container::key::BindingKey;
use crate::container::provider::{take_arg, ErasedArg, OutputSignature};
use crate::errors::{BoxError, CoreError};

/// Erased modifier action stored inside a modifier wrapper.
pub type ActionFn = Box<dyn Fn(Vec<ErasedArg>) -> Result<(), BoxError> + Send + Sync>;

/// Uniform wrapper around a registered modifier.
pub struct ModifierWrapper {
    arguments: Vec<BindingKey>,
    action: ActionFn,
}

impl ModifierWrapper {
    /// Build a wrapper from signature metadata, validating the output shape.
    ///
    /// A modifier may declare no output or a single failure channel; anything
    /// else is rejected with [`CoreError::InvalidModifierSignature`].
    pub fn from_parts(
        arguments: Vec<BindingKey>,
        outputs: OutputSignature,
        action: ActionFn,
    ) -> Result<Self, CoreError> {
        if outputs.arity > 1 {
            return Err(CoreError::invalid_modifier_signature(
                "modifier must declare at most one output",
            ));
        }

        if outputs.arity == 1 && !outputs.failure_is_error {
            return Err(CoreError::invalid_modifier_signature(
                "modifier output must be an error",
            ));
        }

        Ok(Self { arguments, action })
    }

    /// Declared argument keys, in positional order
    pub fn arguments(&self) -> &[BindingKey] {
        &self.arguments
    }

    /// Invoke the underlying modifier with resolved arguments.
    pub(crate) fn invoke(&self, args: Vec<ErasedArg>) -> Result<(), BoxError> {
        (self.action)(args)
    }
}

impl fmt::Debug for ModifierWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModifierWrapper")
            .field("arguments", &self.arguments)
            .field("action", &"<action_fn>")
            .finish()
    }
}

/// Infallible modifier: `Fn(Arc<A1>, .., Arc<An>)`.
pub trait ModifierFn<Args>: Send + Sync + 'static {
    /// Wrap this modifier into a [`ModifierWrapper`]
    fn into_modifier(self) -> Result<ModifierWrapper, CoreError>;
}

/// Fallible modifier: `Fn(Arc<A1>, .., Arc<An>) -> Result<(), E>` where
/// `E: std::error::Error + Send + Sync` is the failure channel.
pub trait TryModifierFn<Args>: Send + Sync + 'static {
    /// Wrap this modifier into a [`ModifierWrapper`]
    fn into_modifier(self) -> Result<ModifierWrapper, CoreError>;
}

impl<F> ModifierFn<()> for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn into_modifier(self) -> Result<ModifierWrapper, CoreError> {
        let action: ActionFn = Box::new(move |_args| {
            (self)();
            Ok(())
        });
        ModifierWrapper::from_parts(
            Vec::new(),
            OutputSignature {
                arity: 0,
                failure_is_error: false,
            },
            action,
        )
    }
}

impl<F, E> TryModifierFn<()> for F
where
    F: Fn() -> Result<(), E> + Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    fn into_modifier(self) -> Result<ModifierWrapper, CoreError> {
        let action: ActionFn =
            Box::new(move |_args| (self)().map_err(|err| Box::new(err) as BoxError));
        ModifierWrapper::from_parts(
            Vec::new(),
            OutputSignature {
                arity: 1,
                failure_is_error: true,
            },
            action,
        )
    }
}

macro_rules! impl_modifier_fn {
    ($(($ty:ident, $var:ident)),+) => {
        impl<F, $($ty),+> ModifierFn<($(Arc<$ty>,)+)> for F
        where
            F: Fn($(Arc<$ty>),+) + Send + Sync + 'static,
            $($ty: ?Sized + Send + Sync + 'static,)+
        {
            fn into_modifier(self) -> Result<ModifierWrapper, CoreError> {
                let arguments = vec![$(BindingKey::of::<$ty>()),+];
                let action: ActionFn = Box::new(move |args| {
                    let mut args = args.into_iter();
                    $(let $var = take_arg::<$ty>(&mut args)?;)+
                    (self)($($var),+);
                    Ok(())
                });
                ModifierWrapper::from_parts(
                    arguments,
                    OutputSignature { arity: 0, failure_is_error: false },
                    action,
                )
            }
        }

        impl<F, E, $($ty),+> TryModifierFn<($(Arc<$ty>,)+)> for F
        where
            F: Fn($(Arc<$ty>),+) -> Result<(), E> + Send + Sync + 'static,
            E: std::error::Error + Send + Sync + 'static,
            $($ty: ?Sized + Send + Sync + 'static,)+
        {
            fn into_modifier(self) -> Result<ModifierWrapper, CoreError> {
                let arguments = vec![$(BindingKey::of::<$ty>()),+];
                let action: ActionFn = Box::new(move |args| {
                    let mut args = args.into_iter();
                    $(let $var = take_arg::<$ty>(&mut args)?;)+
                    (self)($($var),+).map_err(|err| Box::new(err) as BoxError)
                });
                ModifierWrapper::from_parts(
                    arguments,
                    OutputSignature { arity: 1, failure_is_error: true },
                    action,
                )
            }
        }
    };
}

impl_modifier_fn!((A1, a1));
impl_modifier_fn!((A1, a1), (A2, a2));
impl_modifier_fn!((A1, a1), (A2, a2), (A3, a3));
impl_modifier_fn!((A1, a1), (A2, a2), (A3, a3), (A4, a4));
impl_modifier_fn!((A1, a1), (A2, a2), (A3, a3), (A4, a4), (A5, a5));
impl_modifier_fn!((A1, a1), (A2, a2), (A3, a3), (A4, a4), (A5, a5), (A6, a6));
impl_modifier_fn!(
    (A1, a1),
    (A2, a2),
    (A3, a3),
    (A4, a4),
    (A5, a5),
    (A6, a6),
    (A7, a7)
);
impl_modifier_fn!(
    (A1, a1),
    (A2, a2),
    (A3, a3),
    (A4, a4),
    (A5, a5),
    (A6, a6),
    (A7, a7),
    (A8, a8)
);
