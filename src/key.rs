//! Registry keys
//!
//! A [`ServiceKey`] is derived from the *signature* of the factory that
//! produces a service, not from the service type alone. Registration derives
//! it from the factory it is handed, resolution synthesizes the same signature
//! from the requested type, so both sides always land on the same slot.

use crate::Injectable;
use crate::entry::Factory;
use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifies one registration: `(factory signature, optional name)`.
///
/// Two keys are equal iff their signatures and names are equal. The
/// signature's type name is carried along for diagnostics only.
///
/// # Examples
///
/// ```rust
/// use service_resolver::ServiceKey;
///
/// let plain = ServiceKey::for_service::<u32>(None);
/// let named = ServiceKey::for_service::<u32>(Some("port"));
///
/// assert_ne!(plain, named);
/// assert_eq!(named.name(), Some("port"));
/// assert_eq!(plain, ServiceKey::for_service::<u32>(None));
/// ```
#[derive(Clone)]
pub struct ServiceKey {
    signature: TypeId,
    signature_name: &'static str,
    name: Option<String>,
}

impl ServiceKey {
    /// Key for a service of type `T`, optionally qualified by `name`.
    ///
    /// The signature component is `TypeId::of::<Factory<T>>()`, i.e. the
    /// identity of "takes the container, returns `T`".
    #[inline]
    pub fn for_service<T: Injectable>(name: Option<&str>) -> Self {
        Self {
            signature: TypeId::of::<Factory<T>>(),
            signature_name: type_name::<Factory<T>>(),
            name: name.map(str::to_owned),
        }
    }

    /// The optional disambiguating name.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Human-readable form of the factory signature.
    #[inline]
    pub fn signature_name(&self) -> &'static str {
        self.signature_name
    }
}

impl PartialEq for ServiceKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.signature == other.signature && self.name == other.name
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.signature.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceKey")
            .field("signature", &self.signature_name())
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} (name: \"{}\")", self.signature_name(), name),
            None => f.write_str(self.signature_name()),
        }
    }
}
