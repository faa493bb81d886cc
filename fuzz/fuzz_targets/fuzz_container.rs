#![no_main]

//! Fuzz target for registration and resolution
//!
//! Replays random register/resolve/remove_all sequences and checks every
//! resolve against a model of what should be registered.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use service_resolver::Container;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Arbitrary)]
struct SmallService {
    id: u32,
    name: String,
}

#[derive(Clone, Debug, PartialEq, Arbitrary)]
struct Wrapper {
    inner: Option<SmallService>,
}

/// Names drawn from a small set so collisions actually happen
#[derive(Clone, Copy, Debug, Arbitrary)]
enum Slot {
    Unnamed,
    A,
    B,
}

impl Slot {
    fn name(self) -> Option<&'static str> {
        match self {
            Slot::Unnamed => None,
            Slot::A => Some("a"),
            Slot::B => Some("b"),
        }
    }
}

#[derive(Debug, Arbitrary)]
enum ContainerOp {
    Register(Slot, SmallService),
    RegisterWrapper,
    RegisterCycle,
    Resolve(Slot),
    ResolveWrapper,
    ResolveU8,
    Contains(Slot),
    RemoveAll,
    Describe,
}

fn resolve_small(container: &Container, slot: Slot) -> Option<SmallService> {
    match slot.name() {
        Some(name) => container.resolve_named::<SmallService>(name),
        None => container.resolve::<SmallService>(),
    }
}

fuzz_target!(|ops: Vec<ContainerOp>| {
    let container = Container::new();

    // Model of the registry: slot -> value the factory returns
    let mut model: HashMap<Option<&'static str>, SmallService> = HashMap::new();
    let mut has_wrapper = false;
    let mut has_cycle = false;

    for op in ops {
        match op {
            ContainerOp::Register(slot, svc) => {
                model.insert(slot.name(), svc.clone());
                let factory = move |_: &Container| svc.clone();
                match slot.name() {
                    Some(name) => {
                        container.register_named(name, factory);
                    }
                    None => {
                        container.register(factory);
                    }
                }
            }
            ContainerOp::RegisterWrapper => {
                container.register(|r| Wrapper {
                    inner: r.resolve::<SmallService>(),
                });
                has_wrapper = true;
            }
            ContainerOp::RegisterCycle => {
                container.register(|r| r.resolve::<u8>().map_or(0, |n| n.wrapping_add(1)));
                has_cycle = true;
            }
            ContainerOp::Resolve(slot) => {
                assert_eq!(resolve_small(&container, slot), model.get(&slot.name()).cloned());
            }
            ContainerOp::ResolveWrapper => {
                let result = container.resolve::<Wrapper>();
                if has_wrapper {
                    let expected = model.get(&None).cloned();
                    assert_eq!(result, Some(Wrapper { inner: expected }));
                } else {
                    assert!(result.is_none());
                }
            }
            ContainerOp::ResolveU8 => {
                let expected = if has_cycle { Some(0) } else { None };
                assert_eq!(container.resolve::<u8>(), expected);
            }
            ContainerOp::Contains(slot) => {
                let found = match slot.name() {
                    Some(name) => container.contains_named::<SmallService>(name),
                    None => container.contains::<SmallService>(),
                };
                assert_eq!(found, model.contains_key(&slot.name()));
            }
            ContainerOp::RemoveAll => {
                container.remove_all();
                model.clear();
                has_wrapper = false;
                has_cycle = false;
            }
            ContainerOp::Describe => {
                let text = container.describe();
                assert!(text.starts_with('[') && text.ends_with(']'));
                assert_eq!(text.lines().count(), container.len() + 2);
            }
        }

        let expected_len = model.len() + usize::from(has_wrapper) + usize::from(has_cycle);
        assert_eq!(container.len(), expected_len);
    }
});
