//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```

use service_resolver::Container;

#[allow(dead_code)]
struct Database {
    url: String,
}

#[allow(dead_code)]
struct UserService {
    db: Database,
}

fn main() {
    // JSON if logging-json is enabled, pretty otherwise; TRACE shows factory calls
    service_resolver::logging::builder().trace().init();

    println!("=== Service Resolver Logging Demo ===\n");

    // logs: "Creating new service container", "Registering service factory", "Container initialized"
    let container = Container::build(|c| {
        c.register_named("primary", |_| Database {
            url: "postgres://localhost/app".into(),
        });
        c.register(|r| UserService {
            db: r.resolve_named::<Database>("primary").unwrap(),
        });
    });

    // logs: "Invoking service factory" at depth 1 and then depth 2
    let _users = container.resolve::<UserService>().unwrap();

    // logs: "Service not registered"
    assert!(container.resolve::<Database>().is_none());

    // logs: "Registering service factory" with replaced = true
    container.register_named("primary", |_| Database {
        url: "postgres://failover/app".into(),
    });

    // logs: "Circular dependency detected"
    container.register(|r| r.resolve::<u32>().map_or(0, |n| n + 1));
    assert_eq!(container.resolve::<u32>(), Some(0));

    println!("{container}");

    // logs: "All registrations removed"
    container.remove_all();

    println!("\n=== Demo Complete ===");
    println!("Tip: Use --features logging-json for production (JSON output)");
    println!("     Use --features logging-pretty for development (colorful output)");
}
