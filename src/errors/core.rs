use thiserror::Error;

/// Boxed failure produced by a provider or modifier failure channel.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Core error type for container compilation and resolution.
///
/// Every variant is fatal to the operation that raised it; compilation is
/// all-or-nothing and no error is silently retried.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{binding} already provided")]
    DuplicateBinding { binding: String },

    #[error("type {binding} not provided")]
    BindingNotFound { binding: String },

    #[error("invalid provider signature: {message}")]
    InvalidProviderSignature { message: String },

    #[error("invalid modifier signature: {message}")]
    InvalidModifierSignature { message: String },

    #[error("value providers are not implemented")]
    UnimplementedProviderKind,

    #[error("circular dependency detected: {path} (cycle at: {cycle_binding})")]
    CircularDependency { path: String, cycle_binding: String },

    #[error("construction failed for '{binding}': {source}")]
    ConstructionFailed { binding: String, source: BoxError },

    #[error("modifier #{index} failed: {source}")]
    ModifierFailed { index: usize, source: BoxError },

    #[error("invalid populate target: {message}")]
    InvalidPopulateTarget { message: String },

    #[error("lock error on resource: {resource}")]
    LockError { resource: String },

    #[error("dependency resolution failed for '{binding}': {message}")]
    DependencyResolutionFailed { binding: String, message: String },
}

impl CoreError {
    /// Create a new duplicate binding error
    pub fn duplicate_binding(binding: impl Into<String>) -> Self {
        Self::DuplicateBinding {
            binding: binding.into(),
        }
    }

    /// Create a new binding not found error
    pub fn binding_not_found(binding: impl Into<String>) -> Self {
        Self::BindingNotFound {
            binding: binding.into(),
        }
    }

    /// Create a new invalid provider signature error
    pub fn invalid_provider_signature(message: impl Into<String>) -> Self {
        Self::InvalidProviderSignature {
            message: message.into(),
        }
    }

    /// Create a new invalid modifier signature error
    pub fn invalid_modifier_signature(message: impl Into<String>) -> Self {
        Self::InvalidModifierSignature {
            message: message.into(),
        }
    }

    /// Create a new invalid populate target error
    pub fn invalid_populate_target(message: impl Into<String>) -> Self {
        Self::InvalidPopulateTarget {
            message: message.into(),
        }
    }

    /// Create a new lock error
    pub fn lock(resource: impl Into<String>) -> Self {
        Self::LockError {
            resource: resource.into(),
        }
    }

    /// Create a new dependency resolution error
    pub fn resolution_failed(binding: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DependencyResolutionFailed {
            binding: binding.into(),
            message: message.into(),
        }
    }

    /// Check if the error is a binding conflict
    pub fn is_duplicate_binding(&self) -> bool {
        matches!(self, Self::DuplicateBinding { .. })
    }

    /// Check if the error is a missing binding
    pub fn is_binding_not_found(&self) -> bool {
        matches!(self, Self::BindingNotFound { .. })
    }

    /// Check if the error is a dependency cycle
    pub fn is_circular_dependency(&self) -> bool {
        matches!(self, Self::CircularDependency { .. })
    }
}
