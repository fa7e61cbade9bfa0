use std::any::TypeId;
use std::fmt;

/// Binding identifier combining a type and an optional name qualifier.
///
/// Used as the map key throughout the registry. Two keys are equal when they
/// identify the same type with the same qualifier; the captured type name is
/// deterministic per `TypeId` and only exists for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingKey {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub name: Option<String>,
}

impl BindingKey {
    /// Create a new binding key for a type
    pub fn of<T: 'static + ?Sized>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            name: None,
        }
    }

    /// Create a named binding key for a type
    pub fn named<T: 'static + ?Sized>(name: impl Into<String>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            name: Some(name.into()),
        }
    }

    /// Copy of this key with the given name qualifier
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            type_id: self.type_id,
            type_name: self.type_name,
            name: Some(name.into()),
        }
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({})",
            self.type_name,
            self.name.as_deref().unwrap_or("default")
        )
    }
}
