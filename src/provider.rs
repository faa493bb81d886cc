//! Provider traits for dependency injection
//!
//! These traits define what types can be produced by a registered factory.

/// Marker trait for types that a factory can produce.
///
/// This is automatically implemented for all `'static` types. Instances are
/// created on every resolve and handed to the caller by value, so unlike the
/// factories themselves they need not be `Send` or `Sync`.
///
/// Trait objects are the usual choice when several implementations share an
/// interface:
///
/// ```rust
/// use service_resolver::Container;
///
/// trait Greeter {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
///
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".into()
///     }
/// }
///
/// let container = Container::new();
/// container.register::<Box<dyn Greeter>, _>(|_| Box::new(English));
///
/// let greeter = container.resolve::<Box<dyn Greeter>>().unwrap();
/// assert_eq!(greeter.greet(), "hello");
/// ```
pub trait Injectable: 'static {}

// Blanket implementation - everything that's 'static is Injectable
impl<T: ?Sized + 'static> Injectable for T {}
