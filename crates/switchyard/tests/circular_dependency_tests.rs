//! Tests for cycle detection across the resolution stack.

use rstest::rstest;
use std::cell::Cell;
use std::rc::Rc;
use switchyard::{Container, DiError, DiResult, Injectable};

#[derive(Clone, Debug)]
struct ServiceA {
	value: u32,
}

impl Injectable for ServiceA {}

#[derive(Clone, Debug)]
struct ServiceB {
	value: u32,
}

impl Injectable for ServiceB {}

#[derive(Clone, Debug)]
struct ServiceC {
	value: u32,
}

impl Injectable for ServiceC {}

#[derive(Clone, Debug)]
struct ServiceD {
	value: u32,
}

impl Injectable for ServiceD {}

#[rstest]
fn test_two_node_cycle_is_detected_at_run() {
	let mut container = Container::new();

	// Registration succeeds; only resolution walks the graph.
	container
		.provide(|b: ServiceB| ServiceA { value: b.value })
		.unwrap();
	container
		.provide(|a: ServiceA| ServiceB { value: a.value })
		.unwrap();

	let error = container
		.run(|_a: ServiceA| -> DiResult<()> { Ok(()) })
		.unwrap_err();

	assert!(matches!(error, DiError::CyclicDependency { .. }));
	let message = error.to_string();
	assert!(message.contains("cyclic dependency"));
	assert!(message.contains(" -> "));
}

#[rstest]
fn test_self_cycle_is_detected() {
	let mut container = Container::new();
	container
		.provide(|a: ServiceA| ServiceA { value: a.value + 1 })
		.unwrap();

	let error = container
		.run(|_a: ServiceA| -> DiResult<()> { Ok(()) })
		.unwrap_err();
	assert!(matches!(error, DiError::CyclicDependency { .. }));
}

#[rstest]
fn test_diamond_is_not_a_cycle() {
	let mut container = Container::new();

	let calls = Rc::new(Cell::new(0usize));
	let counter = Rc::clone(&calls);
	container
		.provide(move || {
			counter.set(counter.get() + 1);
			ServiceA { value: 1 }
		})
		.unwrap();
	container
		.provide(|a: ServiceA| ServiceB { value: a.value + 1 })
		.unwrap();
	container
		.provide(|a: ServiceA| ServiceC { value: a.value + 2 })
		.unwrap();
	container
		.provide(|b: ServiceB, c: ServiceC| ServiceD {
			value: b.value + c.value,
		})
		.unwrap();

	container
		.run(|d: ServiceD| -> DiResult<()> {
			assert_eq!(d.value, 5);
			Ok(())
		})
		.unwrap();

	// The shared root of the diamond is constructed once.
	assert_eq!(calls.get(), 1);
}

#[rstest]
fn test_deep_chain_resolves() {
	let mut container = Container::new();
	container.provide(|| ServiceA { value: 1 }).unwrap();
	container
		.provide(|a: ServiceA| ServiceB { value: a.value + 1 })
		.unwrap();
	container
		.provide(|b: ServiceB| ServiceC { value: b.value + 1 })
		.unwrap();
	container
		.provide(|c: ServiceC| ServiceD { value: c.value + 1 })
		.unwrap();

	container
		.run(|d: ServiceD| -> DiResult<()> {
			assert_eq!(d.value, 4);
			Ok(())
		})
		.unwrap();
}
