//! Provider node state.
//!
//! Nodes hold a provider's descriptor together with its call memoization.
//! Resolvers share nodes through `Rc<RefCell<_>>` handles: a provider with
//! several outputs is one node referenced by several resolvers, so it is
//! still called at most once.

use crate::provider::ProviderDescriptor;
use crate::scope::Scope;
use crate::value::Value;
use std::collections::HashMap;

/// A provider invoked at most once, optionally bound to a fixed scope.
#[derive(Debug)]
pub(crate) struct SimpleProvider {
	pub(crate) descriptor: ProviderDescriptor,
	pub(crate) scope: Option<Scope>,
	/// All outputs of the single call, `None` until the provider ran.
	pub(crate) values: Option<Vec<Value>>,
}

impl SimpleProvider {
	pub(crate) fn new(descriptor: ProviderDescriptor, scope: Option<Scope>) -> Self {
		Self {
			descriptor,
			scope,
			values: None,
		}
	}
}

/// A provider with a scope input and no fixed binding, invoked once per
/// distinct scope.
#[derive(Debug)]
pub(crate) struct ScopeDepProvider {
	pub(crate) descriptor: ProviderDescriptor,
	pub(crate) values_by_scope: HashMap<Scope, Vec<Value>>,
}

impl ScopeDepProvider {
	pub(crate) fn new(descriptor: ProviderDescriptor) -> Self {
		Self {
			descriptor,
			values_by_scope: HashMap::new(),
		}
	}
}
