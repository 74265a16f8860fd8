//! Tests for auto-group aggregation.

use rstest::rstest;
use std::cell::Cell;
use std::rc::Rc;
use switchyard::{Container, DiError, DiResult, Injectable, TypeClass};

#[derive(Clone, Debug, PartialEq)]
struct Check {
	id: u32,
}

impl Injectable for Check {
	fn type_class() -> TypeClass {
		TypeClass::AutoGroup
	}
}

#[rstest]
fn test_elements_aggregate_in_registration_order() {
	let mut container = Container::new();

	container.provide(|| Check { id: 1 }).unwrap();
	container.provide(|| Check { id: 2 }).unwrap();
	container
		.provide(|| vec![Check { id: 3 }, Check { id: 4 }])
		.unwrap();

	container
		.run(|checks: Vec<Check>| -> DiResult<()> {
			let ids: Vec<u32> = checks.iter().map(|check| check.id).collect();
			assert_eq!(ids, vec![1, 2, 3, 4]);
			Ok(())
		})
		.unwrap();
}

#[rstest]
fn test_element_type_cannot_be_requested_directly() {
	let mut container = Container::new();
	container.provide(|| Check { id: 1 }).unwrap();

	let error = container
		.run(|_check: Check| -> DiResult<()> { Ok(()) })
		.unwrap_err();
	assert!(matches!(error, DiError::GroupTypeRequested { .. }));
}

#[rstest]
fn test_bulk_only_registration_still_aggregates() {
	let mut container = Container::new();
	container
		.provide(|| vec![Check { id: 7 }, Check { id: 8 }])
		.unwrap();

	container
		.run(|checks: Vec<Check>| -> DiResult<()> {
			assert_eq!(checks.len(), 2);
			assert_eq!(checks[0].id, 7);
			Ok(())
		})
		.unwrap();
}

#[rstest]
fn test_each_group_provider_called_once() {
	let mut container = Container::new();

	let calls = Rc::new(Cell::new(0usize));
	for id in 0..3u32 {
		let counter = Rc::clone(&calls);
		container
			.provide(move || {
				counter.set(counter.get() + 1);
				Check { id }
			})
			.unwrap();
	}

	// Two consumers of the slice; each provider still runs once.
	container
		.run(|first: Vec<Check>, second: Vec<Check>| -> DiResult<()> {
			assert_eq!(first.len(), 3);
			assert_eq!(second.len(), 3);
			Ok(())
		})
		.unwrap();

	assert_eq!(calls.get(), 3);
}

#[rstest]
fn test_supplied_slice_conflicts_with_group() {
	let mut container = Container::new();
	container.provide(|| Check { id: 1 }).unwrap();

	// The slice form belongs to the group resolver.
	let error = container.supply(vec![Check { id: 2 }]).unwrap_err();
	assert!(matches!(error, DiError::DuplicateProvision { .. }));
}

#[rstest]
fn test_group_after_supplied_slice_is_rejected() {
	let mut container = Container::new();
	container.supply(vec![Check { id: 1 }]).unwrap();

	let error = container.provide(|| Check { id: 2 }).unwrap_err();
	assert!(matches!(error, DiError::DuplicateProvision { .. }));
}
