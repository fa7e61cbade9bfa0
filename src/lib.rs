//! # wirebox
//!
//! A runtime dependency-injection container: constructors ("providers") are
//! registered on a [`ContainerBuilder`], compiled once into a validated
//! dependency graph, and resolved lazily with per-binding memoization.
//!
//! Compilation is all-or-nothing: duplicate bindings, unresolved dependencies,
//! invalid signatures and dependency cycles all abort [`ContainerBuilder::build`]
//! with a single [`CoreError`] describing the first fatal cause.
//!
//! ```
//! use std::sync::Arc;
//! use wirebox::ContainerBuilder;
//!
//! struct Config { url: String }
//! struct Database { url: String }
//!
//! # fn main() -> Result<(), wirebox::CoreError> {
//! let mut builder = ContainerBuilder::new();
//! builder.provide(|| Config { url: "postgres://localhost".into() });
//! builder.provide(|config: Arc<Config>| Database { url: config.url.clone() });
//!
//! let container = builder.build()?;
//! let database = container.resolve::<Database>()?;
//! assert_eq!(database.url, "postgres://localhost");
//!
//! // Instances are memoized: every resolution returns the same Arc.
//! assert!(Arc::ptr_eq(&database, &container.resolve::<Database>()?));
//! # Ok(())
//! # }
//! ```

pub mod container;
pub mod errors;

pub use container::{
    BindingKey, Container, ContainerBuilder, ModifierFn, ModifierWrapper, OutputSignature,
    ProviderBinding, ProviderFn, ProviderKind, ProviderWrapper, TryModifierFn, TryProviderFn,
};
pub use errors::CoreError;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get crate version
pub fn version() -> &'static str {
    VERSION
}
