//! Per-type resolution strategies.
//!
//! Every provided type is owned by exactly one resolver. The container
//! dispatches on the variant; the resolution semantics live in
//! `container.rs` because they recurse back into the engine.

use crate::key::TypeKey;
use crate::location::Location;
use crate::node::{ScopeDepProvider, SimpleProvider};
use crate::provider::{CollectFn, CollectMapFn, SplitFn};
use crate::scope::Scope;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// The container's strategy for producing a value of one type.
#[derive(Clone)]
pub(crate) enum Resolver {
	/// A preregistered value, returned unchanged.
	Supply(SupplyResolver),
	/// Exactly one simple provider.
	Simple(SimpleResolver),
	/// The element entry of an auto-group type; requests are an error.
	Group(Rc<RefCell<GroupResolver>>),
	/// The `Vec<T>` entry of an auto-group type.
	SliceGroup(Rc<RefCell<GroupResolver>>),
	/// The element entry of a one-per-scope type; requests are an error.
	OnePerScope(Rc<RefCell<OnePerScopeResolver>>),
	/// The `HashMap<String, T>` entry of a one-per-scope type.
	MapOfOnePerScope(Rc<RefCell<OnePerScopeResolver>>),
	/// A scoped provider output, invoked once per scope.
	ScopeDep(ScopeDepResolver),
}

#[derive(Clone)]
pub(crate) struct SupplyResolver {
	pub(crate) value: Value,
	pub(crate) location: Location,
}

#[derive(Clone)]
pub(crate) struct SimpleResolver {
	pub(crate) node: Rc<RefCell<SimpleProvider>>,
	pub(crate) output_index: usize,
}

pub(crate) struct GroupResolver {
	pub(crate) elem: TypeKey,
	pub(crate) slice: TypeKey,
	pub(crate) collect: CollectFn,
	/// Contributing providers, in registration order.
	pub(crate) providers: Vec<GroupEntry>,
	/// The slice value, memoized on first assembly.
	pub(crate) assembled: Option<Value>,
}

#[derive(Clone)]
pub(crate) struct GroupEntry {
	pub(crate) node: Rc<RefCell<SimpleProvider>>,
	pub(crate) output_index: usize,
	/// Present when the provider returns a bulk `Vec<T>` to be spread.
	pub(crate) split: Option<SplitFn>,
}

pub(crate) struct OnePerScopeResolver {
	pub(crate) elem: TypeKey,
	pub(crate) map: TypeKey,
	pub(crate) collect: CollectMapFn,
	pub(crate) providers: HashMap<Scope, ScopedEntry>,
}

#[derive(Clone)]
pub(crate) struct ScopedEntry {
	pub(crate) node: Rc<RefCell<SimpleProvider>>,
	pub(crate) output_index: usize,
}

#[derive(Clone)]
pub(crate) struct ScopeDepResolver {
	pub(crate) key: TypeKey,
	pub(crate) output_index: usize,
	pub(crate) node: Rc<RefCell<ScopeDepProvider>>,
}

impl Resolver {
	/// Describes the owning registration for duplicate-provision errors.
	pub(crate) fn describe_location(&self) -> String {
		match self {
			Self::Supply(supply) => format!("{} (supplied value)", supply.location),
			Self::Simple(simple) => simple.node.borrow().descriptor.location.to_string(),
			Self::Group(group) | Self::SliceGroup(group) => {
				let group = group.borrow();
				match group.providers.first() {
					Some(entry) => entry.node.borrow().descriptor.location.to_string(),
					None => format!("auto-group providers of {}", group.elem),
				}
			}
			Self::OnePerScope(per_scope) | Self::MapOfOnePerScope(per_scope) => {
				format!("one-per-scope providers of {}", per_scope.borrow().elem)
			}
			Self::ScopeDep(dep) => dep.node.borrow().descriptor.location.to_string(),
		}
	}
}
