//! # Service Resolver - a small service-locator container for Rust
//!
//! A process-local registry that maps a service type, optionally qualified
//! by a name, to a factory that builds it on demand. Factories receive the
//! container itself and may resolve their own dependencies from it.
//!
//! ## Features
//!
//! - **Type-safe** - entries are stored type-erased and recovered by a key
//!   derived from the factory signature, so a lookup for `T` only ever finds
//!   a factory returning `T`
//! - **Named registrations** - several factories for one type, told apart by name
//! - **Fresh instances** - every resolve runs the factory; there are no scopes
//! - **Cycle reporting** - a factory that (transitively) asks for itself gets
//!   `None` / [`DiError::CircularDependency`] instead of overflowing the stack
//! - **Observable** - optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use service_resolver::Container;
//!
//! trait Pilot {
//!     fn name(&self) -> String;
//! }
//!
//! struct AtAtPilot;
//!
//! impl Pilot for AtAtPilot {
//!     fn name(&self) -> String {
//!         "Joe".into()
//!     }
//! }
//!
//! struct AtAt {
//!     pilot: Box<dyn Pilot>,
//! }
//!
//! let container = Container::build(|c| {
//!     c.register::<Box<dyn Pilot>, _>(|_| Box::new(AtAtPilot));
//!     c.register(|r| AtAt {
//!         pilot: r.resolve::<Box<dyn Pilot>>().unwrap(),
//!     });
//! });
//!
//! let walker = container.resolve::<AtAt>().unwrap();
//! assert_eq!(walker.pilot.name(), "Joe");
//! ```
//!
//! ## Named Registrations
//!
//! ```rust
//! use service_resolver::Container;
//!
//! let container = Container::new();
//! container.register_named("primary", |_| String::from("postgres://primary"));
//! container.register_named("replica", |_| String::from("postgres://replica"));
//!
//! assert_eq!(
//!     container.resolve_named::<String>("replica").as_deref(),
//!     Some("postgres://replica")
//! );
//! ```
//!
//! ## Thread Safety
//!
//! `Container` is `Send + Sync` and registrations go through a concurrent map,
//! but the intended use is to register everything up front and resolve
//! afterwards. Nothing orders a `register` on one thread against a `resolve`
//! on another.

mod container;
mod entry;
mod error;
mod key;
#[cfg(feature = "logging")]
pub mod logging;
mod provider;
mod storage;

pub use container::*;
pub use entry::{Factory, ServiceEntry};
pub use error::*;
pub use key::ServiceKey;
pub use provider::*;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Container, DiError, Injectable, Resolver, Result, ServiceEntry, ServiceKey};
    pub use std::sync::Arc;
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Walkable {
        fn number_of_limbs(&self) -> u32;

        fn pilot(&self) -> Option<&dyn Pilot> {
            None
        }
    }

    trait Pilot {
        fn name(&self) -> String;
    }

    struct Bird;

    impl Walkable for Bird {
        fn number_of_limbs(&self) -> u32 {
            2
        }
    }

    struct AtAt {
        pilot: Box<dyn Pilot>,
    }

    impl Walkable for AtAt {
        fn number_of_limbs(&self) -> u32 {
            4
        }

        fn pilot(&self) -> Option<&dyn Pilot> {
            Some(self.pilot.as_ref())
        }
    }

    struct AtAtPilot;

    impl Pilot for AtAtPilot {
        fn name(&self) -> String {
            "Joe".into()
        }
    }

    #[test]
    fn test_register_basic_type() {
        let container = Container::build(|c| {
            c.register::<Box<dyn Walkable>, _>(|_| Box::new(Bird));
        });

        let walker = container.resolve::<Box<dyn Walkable>>();
        assert!(walker.is_some());
        assert_eq!(walker.unwrap().number_of_limbs(), 2);
    }

    #[test]
    fn test_register_connected_types() {
        let container = Container::build(|c| {
            c.register::<Box<dyn Walkable>, _>(|r| {
                Box::new(AtAt {
                    pilot: r.resolve::<Box<dyn Pilot>>().unwrap(),
                })
            });
            c.register::<Box<dyn Pilot>, _>(|_| Box::new(AtAtPilot));
        });

        let pilot = container.resolve::<Box<dyn Pilot>>().unwrap();
        assert_eq!(pilot.name(), "Joe");

        let walker = container.resolve::<Box<dyn Walkable>>().unwrap();
        assert_eq!(walker.number_of_limbs(), 4);
        assert_eq!(walker.pilot().map(|p| p.name()).as_deref(), Some("Joe"));
    }

    #[test]
    fn test_named_implementations_of_one_interface() {
        let container = Container::new();
        container.register_named::<Box<dyn Walkable>, _>("bird", |_| Box::new(Bird));
        container.register_named::<Box<dyn Walkable>, _>("atat", |_| {
            Box::new(AtAt {
                pilot: Box::new(AtAtPilot),
            })
        });

        let bird = container.resolve_named::<Box<dyn Walkable>>("bird").unwrap();
        let atat = container.resolve_named::<Box<dyn Walkable>>("atat").unwrap();

        assert_eq!(bird.number_of_limbs(), 2);
        assert_eq!(atat.number_of_limbs(), 4);
        assert!(container.resolve::<Box<dyn Walkable>>().is_none());
    }

    #[test]
    fn test_trait_object_wrappers_are_distinct_services() {
        use std::rc::Rc;

        let container = Container::new();
        container.register::<Box<dyn Pilot>, _>(|_| Box::new(AtAtPilot));

        assert!(container.resolve::<Box<dyn Pilot>>().is_some());
        assert!(container.resolve::<Rc<dyn Pilot>>().is_none());
    }

    #[test]
    fn test_remove_all_then_resolve() {
        let container = Container::build(|c| {
            c.register::<Box<dyn Walkable>, _>(|_| Box::new(Bird));
        });

        container.remove_all();
        assert!(container.resolve::<Box<dyn Walkable>>().is_none());
    }
}
