//! Registered entries
//!
//! An entry pairs one factory with the type metadata needed to describe it.
//! Entries are immutable: re-registering a key stores a fresh entry.

use crate::key::ServiceKey;
use crate::{Container, Injectable};
use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

/// The call signature every factory for `T` is stored as.
///
/// Its `TypeId` is the signature half of a [`ServiceKey`].
pub type Factory<T> = dyn Fn(&Container) -> T + Send + Sync;

/// Type-erased view of an entry, as held by the registry.
pub(crate) trait EntryType: Any + Send + Sync {
    /// One-line description of this entry under `key`.
    fn describe(&self, key: &ServiceKey) -> String;

    /// Erase to `Any` so the caller can downcast back to `ServiceEntry<T>`.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// A factory registered for service type `T`.
///
/// Returned by [`Container::register`] so callers can inspect what was stored.
///
/// # Examples
///
/// ```rust
/// use service_resolver::Container;
///
/// let container = Container::new();
/// let entry = container.register(|_| 8080_u16);
///
/// assert_eq!(entry.service_type(), "u16");
/// assert_eq!(entry.create_instance(&container), 8080);
/// ```
pub struct ServiceEntry<T: Injectable> {
    service_type: &'static str,
    factory_type: &'static str,
    factory: Arc<Factory<T>>,
}

impl<T: Injectable> ServiceEntry<T> {
    /// Wrap `factory`. Any callable with the right signature is accepted.
    #[inline]
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        Self {
            service_type: type_name::<T>(),
            factory_type: type_name::<F>(),
            factory: Arc::new(factory),
        }
    }

    /// Name of the service type this entry produces.
    #[inline]
    pub fn service_type(&self) -> &'static str {
        self.service_type
    }

    /// Name of the concrete factory type (usually a closure).
    #[inline]
    pub fn factory_type(&self) -> &'static str {
        self.factory_type
    }

    /// Run the factory once with `resolver` as its dependency source.
    #[inline]
    pub fn create_instance(&self, resolver: &Container) -> T {
        (self.factory)(resolver)
    }

    /// `Service: <type>[, Name: "<name>"], Factory: <factory type>`
    pub fn describe(&self, key: &ServiceKey) -> String {
        let name = key
            .name()
            .map(|n| format!(", Name: \"{n}\""))
            .unwrap_or_default();

        format!(
            "Service: {}{}, Factory: {}",
            self.service_type, name, self.factory_type
        )
    }
}

impl<T: Injectable> EntryType for ServiceEntry<T> {
    #[inline]
    fn describe(&self, key: &ServiceKey) -> String {
        ServiceEntry::describe(self, key)
    }

    #[inline]
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl<T: Injectable> fmt::Debug for ServiceEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceEntry")
            .field("service_type", &self.service_type)
            .field("factory_type", &self.factory_type)
            .finish()
    }
}
