//! Error types for service resolution

use thiserror::Error;

/// Errors reported by [`Container::try_resolve`](crate::Container::try_resolve).
///
/// The plain `resolve` methods fold every variant into `None`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiError {
    /// No factory is registered for the requested type and name
    #[error("Service not found: {type_name}{}", display_name(.name))]
    NotFound {
        type_name: &'static str,
        name: Option<String>,
    },

    /// A factory asked, directly or transitively, for the service it is producing
    #[error("Circular dependency detected while resolving {type_name}{}: {path}", display_name(.name))]
    CircularDependency {
        type_name: &'static str,
        name: Option<String>,
        path: String,
    },
}

fn display_name(name: &Option<String>) -> String {
    name.as_ref()
        .map(|n| format!(" (name: \"{n}\")"))
        .unwrap_or_default()
}

impl DiError {
    /// Create a NotFound error for a type
    #[inline]
    pub fn not_found<T: ?Sized + 'static>(name: Option<&str>) -> Self {
        Self::NotFound {
            type_name: std::any::type_name::<T>(),
            name: name.map(str::to_owned),
        }
    }

    /// Create a CircularDependency error
    #[inline]
    pub fn circular<T: ?Sized + 'static>(name: Option<&str>, path: impl Into<String>) -> Self {
        Self::CircularDependency {
            type_name: std::any::type_name::<T>(),
            name: name.map(str::to_owned),
            path: path.into(),
        }
    }

    /// True when the error only reports a missing registration
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias for resolution
pub type Result<T> = std::result::Result<T, DiError>;
