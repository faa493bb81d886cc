//! Walkers and their pilots
//!
//! ```bash
//! cargo run --example walkers
//! ```

use service_resolver::{Container, Resolver};

trait Walkable {
    fn number_of_limbs(&self) -> u32;
    fn describe(&self) -> String;
}

trait Pilot {
    fn name(&self) -> String;
}

struct Bird;

impl Walkable for Bird {
    fn number_of_limbs(&self) -> u32 {
        2
    }

    fn describe(&self) -> String {
        "a bird".into()
    }
}

struct AtAt {
    pilot: Box<dyn Pilot>,
}

impl Walkable for AtAt {
    fn number_of_limbs(&self) -> u32 {
        4
    }

    fn describe(&self) -> String {
        format!("an AT-AT piloted by {}", self.pilot.name())
    }
}

struct AtAtPilot;

impl Pilot for AtAtPilot {
    fn name(&self) -> String {
        "Joe".into()
    }
}

/// Only needs lookups, so it takes any `Resolver`
fn report<R: Resolver>(resolver: &R, name: &str) {
    match resolver.resolve_named::<Box<dyn Walkable>>(name) {
        Some(walker) => println!(
            "{name}: {} with {} limbs",
            walker.describe(),
            walker.number_of_limbs()
        ),
        None => println!("{name}: nothing registered"),
    }
}

fn main() {
    let container = Container::build(|c| {
        c.register::<Box<dyn Pilot>, _>(|_| Box::new(AtAtPilot));
        c.register_named::<Box<dyn Walkable>, _>("bird", |_| Box::new(Bird));
        c.register_named::<Box<dyn Walkable>, _>("atat", |r| {
            let pilot = r
                .resolve::<Box<dyn Pilot>>()
                .unwrap_or_else(|| Box::new(AtAtPilot));
            Box::new(AtAt { pilot })
        });
    });

    println!("Registrations:\n{container}\n");

    for name in ["bird", "atat", "tauntaun"] {
        report(&container, name);
    }
}
