//! Service-locator container
//!
//! The `Container` maps [`ServiceKey`]s to factories and runs the matching
//! factory every time a service is resolved. Factories receive the container
//! itself, so they can resolve their own dependencies to any depth.

use crate::entry::{EntryType, ServiceEntry};
use crate::key::ServiceKey;
use crate::storage::ServiceStorage;
use crate::{DiError, Injectable, Result};
use std::any::type_name;
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace, warn};

// =============================================================================
// In-flight resolution tracking
// =============================================================================

/// One factory currently running on this thread.
struct InFlight {
    /// Identity of the registry the factory came from
    registry: usize,
    key: ServiceKey,
    service: &'static str,
}

impl InFlight {
    fn label(&self) -> String {
        label(self.service, &self.key)
    }
}

fn label(service: &'static str, key: &ServiceKey) -> String {
    match key.name() {
        Some(name) => format!("{service}(\"{name}\")"),
        None => service.to_owned(),
    }
}

thread_local! {
    /// Stack of factories being run, innermost last
    static IN_FLIGHT: RefCell<Vec<InFlight>> = const { RefCell::new(Vec::new()) };
}

/// Pops the in-flight stack when dropped, including on unwind.
struct ResolutionGuard {
    #[cfg_attr(not(feature = "logging"), allow(dead_code))]
    depth: usize,
}

impl ResolutionGuard {
    /// Mark `key` as in flight, or return the cycle path if it already is.
    fn enter(
        registry: usize,
        key: &ServiceKey,
        service: &'static str,
    ) -> std::result::Result<Self, String> {
        IN_FLIGHT.with(|stack| {
            let mut stack = stack.borrow_mut();

            if let Some(start) = stack
                .iter()
                .position(|f| f.registry == registry && f.key == *key)
            {
                let mut path: Vec<String> = stack[start..].iter().map(InFlight::label).collect();
                path.push(label(service, key));
                return Err(path.join(" -> "));
            }

            stack.push(InFlight {
                registry,
                key: key.clone(),
                service,
            });
            Ok(Self { depth: stack.len() })
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        IN_FLIGHT.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Anything that can look services up by type and optional name.
///
/// [`Container`] is the only implementation in this crate; the trait lets
/// code that merely *consumes* services stay generic over where they come from.
pub trait Resolver {
    /// Resolve the unnamed registration for `T`.
    fn resolve<T: Injectable>(&self) -> Option<T>;

    /// Resolve the registration for `T` under `name`.
    fn resolve_named<T: Injectable>(&self, name: &str) -> Option<T>;
}

// =============================================================================
// Container
// =============================================================================

/// Registry of factories keyed by service type and optional name.
///
/// Every resolve invokes the registered factory; nothing is cached. Clones
/// share the same registry.
///
/// # Examples
///
/// ```rust
/// use service_resolver::Container;
///
/// struct Config {
///     url: String,
/// }
///
/// struct Database {
///     url: String,
/// }
///
/// let container = Container::build(|c| {
///     c.register(|_| Config { url: "postgres://localhost".into() });
///     c.register(|r| Database {
///         url: r.resolve::<Config>().unwrap().url,
///     });
/// });
///
/// let db = container.resolve::<Database>().unwrap();
/// assert_eq!(db.url, "postgres://localhost");
/// ```
///
/// # Cyclic registrations
///
/// A factory for `A` that (transitively) resolves `A` again is detected while
/// it runs: the inner request yields `None` from [`resolve`](Self::resolve)
/// and [`DiError::CircularDependency`] from [`try_resolve`](Self::try_resolve).
#[derive(Clone)]
pub struct Container {
    storage: Arc<ServiceStorage>,
}

impl Container {
    /// Create an empty container.
    #[inline]
    pub fn new() -> Self {
        #[cfg(feature = "logging")]
        debug!(target: "service_resolver", "Creating new service container");

        Self {
            storage: Arc::new(ServiceStorage::new()),
        }
    }

    /// Create an empty container with room for `capacity` registrations.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "service_resolver",
            capacity,
            "Creating new service container with capacity"
        );

        Self {
            storage: Arc::new(ServiceStorage::with_capacity(capacity)),
        }
    }

    /// Create a container and hand it to `init` once to register services.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use service_resolver::Container;
    ///
    /// let container = Container::build(|c| {
    ///     c.register(|_| 42_u32);
    ///     c.register_named("greeting", |_| String::from("hi"));
    /// });
    ///
    /// assert_eq!(container.len(), 2);
    /// ```
    pub fn build<F>(init: F) -> Self
    where
        F: FnOnce(&Container),
    {
        let container = Self::new();
        init(&container);

        #[cfg(feature = "logging")]
        debug!(
            target: "service_resolver",
            service_count = container.len(),
            "Container initialized"
        );

        container
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register the unnamed factory for `T`, replacing any previous one.
    ///
    /// The factory is run on every resolve and receives this container so it
    /// can resolve its own dependencies.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use service_resolver::Container;
    ///
    /// trait Walkable {
    ///     fn limbs(&self) -> u32;
    /// }
    ///
    /// struct Bird;
    ///
    /// impl Walkable for Bird {
    ///     fn limbs(&self) -> u32 {
    ///         2
    ///     }
    /// }
    ///
    /// let container = Container::new();
    /// container.register::<Box<dyn Walkable>, _>(|_| Box::new(Bird));
    ///
    /// assert_eq!(container.resolve::<Box<dyn Walkable>>().unwrap().limbs(), 2);
    /// ```
    #[inline]
    pub fn register<T, F>(&self, factory: F) -> Arc<ServiceEntry<T>>
    where
        T: Injectable,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        self.insert_entry(None, factory)
    }

    /// Register a factory for `T` under `name`, replacing any previous one.
    ///
    /// Named registrations are independent of each other and of the unnamed one.
    #[inline]
    pub fn register_named<T, F>(&self, name: &str, factory: F) -> Arc<ServiceEntry<T>>
    where
        T: Injectable,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        self.insert_entry(Some(name), factory)
    }

    fn insert_entry<T, F>(&self, name: Option<&str>, factory: F) -> Arc<ServiceEntry<T>>
    where
        T: Injectable,
        F: Fn(&Container) -> T + Send + Sync + 'static,
    {
        let key = ServiceKey::for_service::<T>(name);
        let entry = Arc::new(ServiceEntry::<T>::new(factory));

        let replaced = self
            .storage
            .insert(key, Arc::clone(&entry) as Arc<dyn EntryType>);

        #[cfg(feature = "logging")]
        debug!(
            target: "service_resolver",
            service = type_name::<T>(),
            name = ?name,
            replaced,
            service_count = self.storage.len(),
            "Registering service factory"
        );
        #[cfg(not(feature = "logging"))]
        let _ = replaced;

        entry
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve the unnamed registration for `T`.
    ///
    /// Returns `None` when nothing is registered (or the request closes a
    /// dependency cycle).
    #[inline]
    pub fn resolve<T: Injectable>(&self) -> Option<T> {
        self.resolve_key::<T>(None).ok()
    }

    /// Resolve the registration for `T` under `name`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use service_resolver::Container;
    ///
    /// let container = Container::new();
    /// container.register_named("primary", |_| String::from("db-1"));
    /// container.register_named("replica", |_| String::from("db-2"));
    ///
    /// assert_eq!(container.resolve_named::<String>("replica").as_deref(), Some("db-2"));
    /// assert!(container.resolve::<String>().is_none());
    /// ```
    #[inline]
    pub fn resolve_named<T: Injectable>(&self, name: &str) -> Option<T> {
        self.resolve_key::<T>(Some(name)).ok()
    }

    /// Like [`resolve`](Self::resolve), but reports why nothing was produced.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use service_resolver::{Container, DiError};
    ///
    /// let container = Container::new();
    /// let err = container.try_resolve::<u8>().unwrap_err();
    /// assert!(matches!(err, DiError::NotFound { .. }));
    /// ```
    #[inline]
    pub fn try_resolve<T: Injectable>(&self) -> Result<T> {
        self.resolve_key::<T>(None)
    }

    /// Like [`resolve_named`](Self::resolve_named), but reports why nothing was produced.
    #[inline]
    pub fn try_resolve_named<T: Injectable>(&self, name: &str) -> Result<T> {
        self.resolve_key::<T>(Some(name))
    }

    fn resolve_key<T: Injectable>(&self, name: Option<&str>) -> Result<T> {
        let key = ServiceKey::for_service::<T>(name);

        let Some(entry) = self.storage.get(&key) else {
            #[cfg(feature = "logging")]
            debug!(
                target: "service_resolver",
                service = type_name::<T>(),
                name = ?name,
                "Service not registered"
            );
            return Err(DiError::not_found::<T>(name));
        };

        let entry = recover_entry::<T>(entry, &key);

        let guard = ResolutionGuard::enter(self.registry_id(), &key, type_name::<T>())
            .map_err(|path| {
                #[cfg(feature = "logging")]
                warn!(
                    target: "service_resolver",
                    service = type_name::<T>(),
                    name = ?name,
                    path = %path,
                    "Circular dependency detected"
                );
                DiError::circular::<T>(name, path)
            })?;

        #[cfg(feature = "logging")]
        trace!(
            target: "service_resolver",
            service = type_name::<T>(),
            name = ?name,
            depth = guard.depth,
            "Invoking service factory"
        );

        let instance = entry.create_instance(self);
        drop(guard);

        Ok(instance)
    }

    #[inline]
    fn registry_id(&self) -> usize {
        Arc::as_ptr(&self.storage) as usize
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// Check whether an unnamed factory for `T` is registered.
    #[inline]
    pub fn contains<T: Injectable>(&self) -> bool {
        self.storage.contains(&ServiceKey::for_service::<T>(None))
    }

    /// Check whether a factory for `T` is registered under `name`.
    #[inline]
    pub fn contains_named<T: Injectable>(&self, name: &str) -> bool {
        self.storage.contains(&ServiceKey::for_service::<T>(Some(name)))
    }

    /// Number of registrations.
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Remove every registration.
    #[inline]
    pub fn remove_all(&self) {
        #[cfg(feature = "logging")]
        let count = self.storage.len();

        self.storage.clear();

        #[cfg(feature = "logging")]
        debug!(
            target: "service_resolver",
            services_removed = count,
            "All registrations removed"
        );
    }

    /// Listing of every registration, one per line, sorted.
    ///
    /// ```text
    /// [
    ///     { Service: u32, Factory: app::main::{{closure}} },
    ///     { Service: alloc::string::String, Name: "greeting", Factory: app::main::{{closure}} }
    /// ]
    /// ```
    pub fn describe(&self) -> String {
        let body = self
            .storage
            .descriptions()
            .iter()
            .map(|line| format!("\n    {{ {line} }}"))
            .collect::<Vec<_>>()
            .join(",");

        format!("[{body}\n]")
    }
}

/// Recover the concrete entry type from a lookup by `key`.
///
/// Keys for `T` are only ever built from `Factory<T>`, so the downcast
/// cannot fail unless the registry itself is corrupted.
fn recover_entry<T: Injectable>(entry: Arc<dyn EntryType>, key: &ServiceKey) -> Arc<ServiceEntry<T>> {
    match entry.into_any().downcast::<ServiceEntry<T>>() {
        Ok(entry) => entry,
        Err(_) => panic!(
            "registry invariant violated: entry stored under {key} is not a factory for {}",
            type_name::<T>()
        ),
    }
}

impl Resolver for Container {
    #[inline]
    fn resolve<T: Injectable>(&self) -> Option<T> {
        Container::resolve(self)
    }

    #[inline]
    fn resolve_named<T: Injectable>(&self, name: &str) -> Option<T> {
        Container::resolve_named(self, name)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("service_count", &self.storage.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::AssertUnwindSafe;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct TestService {
        value: String,
    }

    #[derive(Debug)]
    struct Consumer {
        inner: TestService,
    }

    #[test]
    fn test_register_and_resolve() {
        let container = Container::new();
        container.register(|_| TestService {
            value: "test".into(),
        });

        let service = container.resolve::<TestService>().unwrap();
        assert_eq!(service.value, "test");
    }

    #[test]
    fn test_not_found() {
        let container = Container::new();

        assert!(container.resolve::<TestService>().is_none());
        assert!(container.resolve_named::<TestService>("x").is_none());

        let err = container.try_resolve::<TestService>().unwrap_err();
        assert_eq!(err, DiError::not_found::<TestService>(None));
    }

    #[test]
    fn test_named_lookup_does_not_fall_back_to_unnamed() {
        let container = Container::new();
        container.register(|_| TestService {
            value: "default".into(),
        });

        assert!(container.resolve_named::<TestService>("other").is_none());
        assert!(container.contains::<TestService>());
        assert!(!container.contains_named::<TestService>("other"));
    }

    #[test]
    fn test_every_resolve_invokes_factory() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        let container = Container::new();
        container.register(|_| CALLS.fetch_add(1, Ordering::SeqCst));

        let first = container.resolve::<u32>().unwrap();
        let second = container.resolve::<u32>().unwrap();

        assert_eq!(second, first + 1);
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_register_overwrites() {
        let container = Container::new();
        container.register(|_| TestService {
            value: "first".into(),
        });
        container.register(|_| TestService {
            value: "second".into(),
        });

        assert_eq!(container.len(), 1);
        assert_eq!(container.resolve::<TestService>().unwrap().value, "second");
    }

    #[test]
    fn test_named_registrations_are_independent() {
        let container = Container::new();
        container.register_named("a", |_| TestService { value: "a".into() });
        container.register_named("b", |_| TestService { value: "b".into() });
        container.register(|_| TestService {
            value: "unnamed".into(),
        });

        assert_eq!(container.len(), 3);
        assert_eq!(container.resolve_named::<TestService>("a").unwrap().value, "a");
        assert_eq!(container.resolve_named::<TestService>("b").unwrap().value, "b");
        assert_eq!(container.resolve::<TestService>().unwrap().value, "unnamed");

        container.register_named("a", |_| TestService { value: "a2".into() });
        assert_eq!(container.resolve_named::<TestService>("a").unwrap().value, "a2");
        assert_eq!(container.resolve_named::<TestService>("b").unwrap().value, "b");
    }

    #[test]
    fn test_remove_all() {
        let container = Container::build(|c| {
            c.register(|_| TestService { value: "x".into() });
            c.register_named("n", |_| 5_u8);
        });
        assert_eq!(container.len(), 2);

        container.remove_all();

        assert!(container.is_empty());
        assert!(container.resolve::<TestService>().is_none());
        assert!(container.resolve_named::<u8>("n").is_none());
    }

    #[test]
    fn test_with_capacity() {
        for capacity in [0, 16, 64, 500] {
            let container = Container::with_capacity(capacity);
            assert!(container.is_empty());

            container.register(|_| TestService {
                value: "sized".into(),
            });
            container.register_named("n", move |_| capacity);

            assert_eq!(container.len(), 2);
            assert_eq!(container.resolve::<TestService>().unwrap().value, "sized");
            assert_eq!(container.resolve_named::<usize>("n"), Some(capacity));
        }
    }

    #[test]
    fn test_build_runs_init_once() {
        let mut runs = 0;
        let container = Container::build(|c| {
            runs += 1;
            c.register(|_| 1_i64);
        });

        assert_eq!(runs, 1);
        assert_eq!(container.resolve::<i64>(), Some(1));
    }

    #[test]
    fn test_transitive_resolution() {
        let container = Container::new();
        container.register(|r| Consumer {
            inner: r.resolve::<TestService>().unwrap(),
        });
        container.register(|_| TestService {
            value: "dep".into(),
        });

        let consumer = container.resolve::<Consumer>().unwrap();
        assert_eq!(consumer.inner.value, "dep");
    }

    #[test]
    fn test_transitive_missing_dependency() {
        let container = Container::new();
        container.register(|r| r.resolve::<TestService>().map(|inner| Consumer { inner }));

        let consumer = container.resolve::<Option<Consumer>>().unwrap();
        assert!(consumer.is_none());
    }

    #[test]
    fn test_factory_may_register_while_resolving() {
        let container = Container::new();
        container.register(|r| {
            r.register(|_| 7_u16);
            TestService {
                value: "registered".into(),
            }
        });

        assert!(container.resolve::<u16>().is_none());
        container.resolve::<TestService>().unwrap();
        assert_eq!(container.resolve::<u16>(), Some(7));
    }

    #[test]
    fn test_clone_shares_registry() {
        let container = Container::new();
        let handle = container.clone();

        handle.register(|_| 3_u8);
        assert_eq!(container.resolve::<u8>(), Some(3));

        container.remove_all();
        assert!(handle.is_empty());
    }

    #[test]
    fn test_returned_entry_describes_registration() {
        let container = Container::new();
        let entry = container.register_named("port", |_| 8080_u16);

        assert_eq!(entry.service_type(), "u16");
        assert_eq!(entry.create_instance(&container), 8080);
    }

    #[test]
    fn test_describe_empty() {
        assert_eq!(Container::new().describe(), "[\n]");
    }

    #[test]
    fn test_describe_format() {
        let container = Container::new();
        let entry = container.register(|_| 1_u32);

        assert_eq!(
            container.describe(),
            format!("[\n    {{ Service: u32, Factory: {} }}\n]", entry.factory_type())
        );
        assert_eq!(container.to_string(), container.describe());
    }

    #[test]
    fn test_describe_sorted_and_named() {
        let container = Container::new();
        container.register(|_| String::new());
        container.register_named("b", |_| 2_u32);
        container.register_named("a", |_| 1_u32);

        let text = container.describe();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "[");
        assert!(lines[1].starts_with("    { Service: alloc::string::String, Factory: "));
        assert!(lines[1].ends_with(" },"));
        assert!(lines[2].starts_with("    { Service: u32, Name: \"a\", Factory: "));
        assert!(lines[3].starts_with("    { Service: u32, Name: \"b\", Factory: "));
        assert!(lines[3].ends_with(" }"));
        assert_eq!(lines[4], "]");
    }

    #[test]
    fn test_debug_shows_count() {
        let container = Container::new();
        container.register(|_| 0_u8);
        assert_eq!(format!("{container:?}"), "Container { service_count: 1 }");
    }

    #[test]
    fn test_resolver_trait() {
        fn lookup<R: Resolver>(resolver: &R) -> (Option<u8>, Option<u8>) {
            (resolver.resolve(), resolver.resolve_named("n"))
        }

        let container = Container::new();
        container.register(|_| 1_u8);
        container.register_named("n", |_| 2_u8);

        assert_eq!(lookup(&container), (Some(1), Some(2)));
    }

    // -------------------------------------------------------------------------
    // Cycles
    // -------------------------------------------------------------------------

    #[derive(Debug)]
    struct Chicken(Option<Box<Egg>>);

    #[derive(Debug)]
    struct Egg(Option<Box<Chicken>>);

    #[test]
    fn test_self_cycle_reported() {
        let container = Container::new();
        container.register(|r| Chicken(r.resolve::<Chicken>().map(|_| Box::new(Egg(None)))));

        let chicken = container.resolve::<Chicken>().unwrap();
        assert!(chicken.0.is_none());
    }

    #[test]
    fn test_two_step_cycle_reported() {
        let container = Container::new();
        container.register(|r| Chicken(r.resolve::<Egg>().map(Box::new)));
        container.register(|r| {
            let inner = r.try_resolve::<Chicken>();
            match inner {
                Err(DiError::CircularDependency { path, .. }) => {
                    assert_eq!(path.matches("Chicken").count(), 2);
                    assert_eq!(path.matches(" -> ").count(), 2);
                    Egg(None)
                }
                other => panic!("expected cycle, got {other:?}"),
            }
        });

        let chicken = container.resolve::<Chicken>().unwrap();
        assert!(chicken.0.unwrap().0.is_none());
    }

    #[test]
    fn test_named_cycle_path_includes_names() {
        let container = Container::new();
        container.register_named("loop", |r| {
            let err = r.try_resolve_named::<String>("loop").unwrap_err();
            err.to_string()
        });

        let message = container.resolve_named::<String>("loop").unwrap();
        assert!(message.starts_with("Circular dependency detected while resolving"));
        assert!(message.ends_with("String(\"loop\") -> alloc::string::String(\"loop\")"));
    }

    #[test]
    fn test_same_type_from_other_container_is_not_a_cycle() {
        let outer = Container::new();
        let inner = Container::new();
        inner.register(|_| TestService {
            value: "inner".into(),
        });

        let captured = inner.clone();
        outer.register(move |_| captured.resolve::<TestService>().unwrap());

        assert_eq!(outer.resolve::<TestService>().unwrap().value, "inner");
    }

    #[test]
    fn test_in_flight_stack_unwinds_on_panic() {
        let container = Container::new();
        container.register(|_| -> TestService { panic!("factory failed") });

        let attempt =
            std::panic::catch_unwind(AssertUnwindSafe(|| container.resolve::<TestService>()));
        assert!(attempt.is_err());

        container.register(|_| TestService {
            value: "recovered".into(),
        });
        assert_eq!(container.resolve::<TestService>().unwrap().value, "recovered");
        IN_FLIGHT.with(|stack| assert!(stack.borrow().is_empty()));
    }

    #[test]
    fn test_container_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Container>();
    }

    #[test]
    fn test_concurrent_resolution() {
        let container = Container::new();
        container.register(|_| TestService {
            value: "shared".into(),
        });

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..100 {
                        assert_eq!(container.resolve::<TestService>().unwrap().value, "shared");
                    }
                });
            }
        });
    }

    #[cfg(feature = "logging")]
    mod logging {
        use super::*;
        use tracing_test::traced_test;

        #[test]
        #[traced_test]
        fn test_logs_registration_and_missing_service() {
            let container = Container::new();
            container.register(|_| 1_u8);
            let _ = container.resolve::<u16>();

            assert!(logs_contain("Registering service factory"));
            assert!(logs_contain("Service not registered"));
        }

        #[test]
        #[traced_test]
        fn test_logs_cycle() {
            let container = Container::new();
            container.register(|r| r.resolve::<u8>().unwrap_or(0));

            assert_eq!(container.resolve::<u8>(), Some(0));
            assert!(logs_contain("Circular dependency detected"));
        }
    }
}
