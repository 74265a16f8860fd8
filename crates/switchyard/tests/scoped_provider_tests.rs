//! Tests for scope bindings, scoped providers and one-per-scope types.

use rstest::rstest;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use switchyard::{Container, DiError, DiResult, Injectable, Scope, TypeClass};

#[derive(Clone, Debug)]
struct Handler {
	scope: String,
}

impl Injectable for Handler {
	fn type_class() -> TypeClass {
		TypeClass::OnePerScope
	}
}

#[derive(Clone, Debug)]
struct Conn {
	scope: String,
}

impl Injectable for Conn {}

#[derive(Clone, Debug)]
struct AuthToken {
	scope: String,
}

impl Injectable for AuthToken {}

#[derive(Clone, Debug)]
struct AuditLog {
	scope: String,
}

impl Injectable for AuditLog {}

#[rstest]
fn test_one_provider_per_scope_builds_map() {
	let mut container = Container::new();

	container
		.provide_in_scope("a", |scope: Scope| Handler {
			scope: scope.name().to_string(),
		})
		.unwrap();
	container
		.provide_in_scope("b", |scope: Scope| Handler {
			scope: scope.name().to_string(),
		})
		.unwrap();

	container
		.run(|handlers: HashMap<String, Handler>| -> DiResult<()> {
			assert_eq!(handlers.len(), 2);
			assert_eq!(handlers["a"].scope, "a");
			assert_eq!(handlers["b"].scope, "b");
			Ok(())
		})
		.unwrap();
}

#[rstest]
fn test_one_per_scope_element_cannot_be_requested_directly() {
	let mut container = Container::new();
	container
		.provide_in_scope("a", |scope: Scope| Handler {
			scope: scope.name().to_string(),
		})
		.unwrap();

	let error = container
		.run(|_handler: Handler| -> DiResult<()> { Ok(()) })
		.unwrap_err();
	assert!(matches!(error, DiError::OnePerScopeTypeRequested { .. }));
}

#[rstest]
fn test_one_per_scope_map_is_an_illegal_return_type() {
	let mut container = Container::new();

	let error = container
		.provide(|| HashMap::<String, Handler>::new())
		.unwrap_err();
	assert!(matches!(error, DiError::OnePerScopeReturn { .. }));
	assert!(error.to_string().contains("cannot be used as a return type"));
}

#[rstest]
fn test_one_per_scope_requires_scope_binding() {
	let mut container = Container::new();

	let error = container
		.provide(|| Handler {
			scope: "none".to_string(),
		})
		.unwrap_err();
	assert!(matches!(error, DiError::OnePerScopeOutsideScope { .. }));
}

#[rstest]
fn test_second_provider_in_same_scope_is_rejected() {
	let mut container = Container::new();
	container
		.provide_in_scope("a", |scope: Scope| Handler {
			scope: scope.name().to_string(),
		})
		.unwrap();

	let error = container
		.provide_in_scope("a", |scope: Scope| Handler {
			scope: scope.name().to_string(),
		})
		.unwrap_err();
	assert!(matches!(error, DiError::DuplicateScopedProvision { .. }));
}

#[rstest]
fn test_scoped_provider_runs_once_per_scope() {
	let mut container = Container::new();

	let calls = Rc::new(Cell::new(0usize));
	let counter = Rc::clone(&calls);
	// Scope input without a binding: invoked once per resolving scope.
	container
		.provide(move |scope: Scope| {
			counter.set(counter.get() + 1);
			Conn {
				scope: scope.name().to_string(),
			}
		})
		.unwrap();

	container
		.provide_in_scope("a", |conn: Conn| Handler { scope: conn.scope })
		.unwrap();
	container
		.provide_in_scope("b", |conn: Conn| Handler { scope: conn.scope })
		.unwrap();

	container
		.run(|handlers: HashMap<String, Handler>| -> DiResult<()> {
			assert_eq!(handlers["a"].scope, "a");
			assert_eq!(handlers["b"].scope, "b");
			Ok(())
		})
		.unwrap();

	assert_eq!(calls.get(), 2);
}

#[rstest]
fn test_scoped_provider_is_memoized_within_a_scope() {
	let mut container = Container::new();

	let calls = Rc::new(Cell::new(0usize));
	let counter = Rc::clone(&calls);
	container
		.provide(move |scope: Scope| {
			counter.set(counter.get() + 1);
			Conn {
				scope: scope.name().to_string(),
			}
		})
		.unwrap();

	// Two consumers bound to the same scope share one Conn.
	container
		.provide_in_scope("a", |conn: Conn| AuthToken { scope: conn.scope })
		.unwrap();
	container
		.provide_in_scope("a", |conn: Conn| AuditLog { scope: conn.scope })
		.unwrap();

	container
		.run(|token: AuthToken, log: AuditLog| -> DiResult<()> {
			assert_eq!(token.scope, "a");
			assert_eq!(log.scope, "a");
			Ok(())
		})
		.unwrap();

	assert_eq!(calls.get(), 1);
}

#[rstest]
fn test_scoped_dependency_outside_any_scope_fails() {
	let mut container = Container::new();
	container
		.provide(|scope: Scope| Conn {
			scope: scope.name().to_string(),
		})
		.unwrap();

	let error = container
		.run(|_conn: Conn| -> DiResult<()> { Ok(()) })
		.unwrap_err();
	assert!(matches!(error, DiError::NotInScope { .. }));
}

#[rstest]
fn test_invoker_cannot_take_a_scope() {
	let mut container = Container::new();

	let error = container
		.run(|_scope: Scope| -> DiResult<()> { Ok(()) })
		.unwrap_err();
	assert!(matches!(error, DiError::ScopedInvoker { .. }));
}

#[rstest]
fn test_fixed_scope_provider_sees_its_binding() {
	let mut container = Container::new();

	container
		.provide_in_scope("jobs", |scope: Scope| AuthToken {
			scope: scope.name().to_string(),
		})
		.unwrap();

	container
		.run(|token: AuthToken| -> DiResult<()> {
			assert_eq!(token.scope, "jobs");
			Ok(())
		})
		.unwrap();
}
