//! The container: provider registration and the resolution engine.

use crate::error::{DiError, DiResult};
use crate::graph::DiagnosticGraph;
use crate::key::TypeKey;
use crate::location::Location;
use crate::node::{ScopeDepProvider, SimpleProvider};
use crate::provider::{Injectable, InputSpec, OutputSpec, ProviderDescriptor, ProviderFunction};
use crate::resolver::{
	GroupEntry, GroupResolver, OnePerScopeResolver, Resolver, ScopeDepResolver, ScopedEntry,
	SimpleResolver, SupplyResolver,
};
use crate::scope::Scope;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::io;
use std::panic;
use std::rc::Rc;

/// One frame of the resolution stack, kept for diagnostics.
#[derive(Clone, Debug)]
struct ResolveFrame {
	caller: Location,
	key: TypeKey,
}

/// Cycle-detection key of an in-flight provider call. Scoped providers get
/// one frame per scope, so resolving the same provider for two different
/// scopes is not a cycle.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CallerFrame {
	location: Location,
	scope: Option<Scope>,
}

/// A provider node freshly installed by registration.
enum RegisteredNode {
	Simple(Rc<RefCell<SimpleProvider>>),
	ScopeDep(#[allow(dead_code)] Rc<RefCell<ScopeDepProvider>>),
}

/// A dependency-injection container.
///
/// Providers are registered up front with [`supply`](Container::supply),
/// [`provide`](Container::provide) and
/// [`provide_in_scope`](Container::provide_in_scope); then
/// [`run`](Container::run) resolves an invoker function's inputs by
/// constructing all transitive dependencies, each provider called at most
/// once (once per scope for scoped providers).
///
/// The container is single-threaded: it is neither `Send` nor `Sync`, and
/// resolution is a synchronous depth-first traversal.
pub struct Container {
	resolvers: HashMap<TypeKey, Resolver>,
	scopes: HashMap<String, Scope>,
	resolve_stack: Vec<ResolveFrame>,
	caller_stack: Vec<CallerFrame>,
	caller_set: HashSet<CallerFrame>,
	graph: DiagnosticGraph,
}

impl Container {
	/// Creates an empty container.
	pub fn new() -> Self {
		Self {
			resolvers: HashMap::new(),
			scopes: HashMap::new(),
			resolve_stack: Vec::new(),
			caller_stack: Vec::new(),
			caller_set: HashSet::new(),
			graph: DiagnosticGraph::new(),
		}
	}

	/// Preregisters an already-materialized value of type `T`.
	///
	/// Fails with duplicate provision if anything else owns `T`.
	#[track_caller]
	pub fn supply<T: Injectable>(&mut self, value: T) -> DiResult<()> {
		let key = TypeKey::of::<T>();
		let location = Location::for_supplied(key, panic::Location::caller());
		self.supply_value(Value::new(value), key, location)
	}

	/// Registers a constructor function.
	///
	/// The function's inputs are resolved when one of its outputs is first
	/// requested; it is called at most once. A function whose inputs
	/// include [`Scope`] registers as a scoped provider, invoked once per
	/// scope instead.
	#[track_caller]
	pub fn provide<F, M>(&mut self, provider: F) -> DiResult<()>
	where
		F: ProviderFunction<M>,
	{
		let location = Location::for_function::<F>(panic::Location::caller());
		let descriptor = provider.descriptor(location);
		self.add_node(descriptor, None).map(|_| ())
	}

	/// Registers a constructor function bound to the named scope.
	///
	/// The scope is created on first use. A [`Scope`] input of the function
	/// resolves to this binding.
	#[track_caller]
	pub fn provide_in_scope<F, M>(&mut self, scope_name: impl Into<String>, provider: F) -> DiResult<()>
	where
		F: ProviderFunction<M>,
	{
		let location = Location::for_function::<F>(panic::Location::caller());
		let scope = self.scope(scope_name);
		let descriptor = provider.descriptor(location);
		self.add_node(descriptor, Some(scope)).map(|_| ())
	}

	/// Resolves all inputs of `invoker` and calls it.
	///
	/// The invoker must produce no values other than an error: functions
	/// returning `()` or `DiResult<()>` qualify. Returns the invoker's
	/// error, if any.
	#[track_caller]
	pub fn run<F, M>(&mut self, invoker: F) -> DiResult<()>
	where
		F: ProviderFunction<M>,
	{
		let location = Location::for_function::<F>(panic::Location::caller());
		let descriptor = invoker.descriptor(location.clone());
		if !descriptor.outputs.is_empty() {
			return Err(DiError::InvalidInvoker { location });
		}

		// Stale frames from a failed earlier run would pollute this run's
		// diagnostics.
		self.resolve_stack.clear();

		tracing::debug!(invoker = %location, "registering invoker");
		let node = self.add_node(descriptor, None)?;
		let RegisteredNode::Simple(node) = node else {
			return Err(DiError::ScopedInvoker { location });
		};

		tracing::debug!("building container");
		self.simple_provider_values(&node)?;
		tracing::debug!("done building container");
		Ok(())
	}

	/// Returns the scope registered under `name`, creating it on first use.
	///
	/// Lookups are idempotent: the same name always returns the same scope
	/// object.
	pub fn scope(&mut self, name: impl Into<String>) -> Scope {
		let name = name.into();
		if let Some(scope) = self.scopes.get(&name) {
			return scope.clone();
		}
		let scope = Scope::new(name.clone());
		self.scopes.insert(name, scope.clone());
		scope
	}

	/// Writes the diagnostic graph in GraphViz DOT form.
	///
	/// Type nodes render as ellipses, provider nodes as boxes; nodes touched
	/// by a successful resolution are black, failed ones red, untouched ones
	/// gray.
	pub fn render_graph<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
		self.graph.render(writer)
	}

	// ---- registration ----

	fn supply_value(&mut self, value: Value, key: TypeKey, location: Location) -> DiResult<()> {
		let location_node = self.graph.location_node(&location, None);
		self.graph.mark_used(location_node);
		let type_node = self.graph.type_node(key);
		self.graph.add_edge(location_node, type_node);

		if let Some(existing) = self.resolvers.get(&key) {
			return Err(DiError::DuplicateProvision {
				key,
				location,
				previous: existing.describe_location(),
			});
		}

		tracing::debug!(%key, "supplying value");
		self.resolvers
			.insert(key, Resolver::Supply(SupplyResolver { value, location }));
		Ok(())
	}

	fn add_node(
		&mut self,
		descriptor: ProviderDescriptor,
		scope: Option<Scope>,
	) -> DiResult<RegisteredNode> {
		let location = descriptor.location.clone();
		let location_node = self.graph.location_node(&location, scope.as_ref());

		let scope_key = TypeKey::of::<Scope>();
		let mut has_scope_input = false;
		for input in &descriptor.inputs {
			if input.key == scope_key {
				has_scope_input = true;
			}
			let type_node = self.graph.type_node(input.key);
			self.graph.add_edge(type_node, location_node);
		}

		if scope.is_some() || !has_scope_input {
			tracing::debug!(provider = %location, "registering provider");
			let outputs = descriptor.outputs.clone();
			let node = Rc::new(RefCell::new(SimpleProvider::new(descriptor, scope)));
			for (index, output) in outputs.iter().enumerate() {
				self.register_simple_output(&node, index, output, &location)?;
			}
			Ok(RegisteredNode::Simple(node))
		} else {
			tracing::debug!(provider = %location, "registering scoped provider");
			let outputs = descriptor.outputs.clone();
			let node = Rc::new(RefCell::new(ScopeDepProvider::new(descriptor)));
			for (index, output) in outputs.iter().enumerate() {
				// Scoped providers register their raw output types.
				let key = output.raw_key();
				if let Some(existing) = self.resolvers.get(&key) {
					return Err(DiError::ScopedProviderConflict {
						key,
						location: location.clone(),
						previous: existing.describe_location(),
					});
				}
				tracing::debug!(%key, "registering resolver for scoped type");
				self.resolvers.insert(
					key,
					Resolver::ScopeDep(ScopeDepResolver {
						key,
						output_index: index,
						node: Rc::clone(&node),
					}),
				);
				let type_node = self.graph.type_node(key);
				self.graph.add_edge(location_node, type_node);
			}
			Ok(RegisteredNode::ScopeDep(node))
		}
	}

	fn register_simple_output(
		&mut self,
		node: &Rc<RefCell<SimpleProvider>>,
		index: usize,
		output: &OutputSpec,
		location: &Location,
	) -> DiResult<()> {
		// One-per-scope maps are synthesized by the container only.
		if let OutputSpec::PerScopeMap { map, elem } = output {
			return Err(DiError::OnePerScopeReturn {
				key: *map,
				elem: *elem,
			});
		}

		let key = output.key();
		if let Some(existing) = self.resolvers.get(&key).cloned() {
			tracing::debug!(%key, "found existing resolver");
			return self.append_to_resolver(existing, key, node, index, output, location);
		}

		let scope = node.borrow().scope.clone();
		let location_node = self.graph.location_node(location, scope.as_ref());

		match output {
			OutputSpec::Simple { key } => {
				tracing::debug!(%key, "registering resolver");
				self.resolvers.insert(
					*key,
					Resolver::Simple(SimpleResolver {
						node: Rc::clone(node),
						output_index: index,
					}),
				);
				let type_node = self.graph.type_node(*key);
				self.graph.add_edge(location_node, type_node);
				Ok(())
			}
			OutputSpec::Group {
				elem,
				slice,
				collect,
			}
			| OutputSpec::GroupItems {
				elem,
				slice,
				collect,
				..
			} => {
				if let Some(existing) = self.resolvers.get(slice) {
					return Err(DiError::DuplicateProvision {
						key: *slice,
						location: location.clone(),
						previous: existing.describe_location(),
					});
				}
				tracing::debug!(key = %elem, "registering resolver for auto-group type");
				let split = match output {
					OutputSpec::GroupItems { split, .. } => Some(*split),
					_ => None,
				};
				let group = Rc::new(RefCell::new(GroupResolver {
					elem: *elem,
					slice: *slice,
					collect: *collect,
					providers: vec![GroupEntry {
						node: Rc::clone(node),
						output_index: index,
						split,
					}],
					assembled: None,
				}));
				self.resolvers.insert(*elem, Resolver::Group(Rc::clone(&group)));
				self.resolvers.insert(*slice, Resolver::SliceGroup(group));
				let slice_node = self.graph.type_node(*slice);
				self.graph.set_comment(slice_node, "auto-group");
				self.graph.add_edge(location_node, slice_node);
				Ok(())
			}
			OutputSpec::PerScope { elem, map, collect } => {
				let Some(scope) = scope else {
					return Err(DiError::OnePerScopeOutsideScope {
						key: *elem,
						location: location.clone(),
					});
				};
				if let Some(existing) = self.resolvers.get(map) {
					return Err(DiError::DuplicateProvision {
						key: *map,
						location: location.clone(),
						previous: existing.describe_location(),
					});
				}
				tracing::debug!(key = %elem, "registering resolver for one-per-scope type");
				let mut providers = HashMap::new();
				providers.insert(
					scope,
					ScopedEntry {
						node: Rc::clone(node),
						output_index: index,
					},
				);
				let per_scope = Rc::new(RefCell::new(OnePerScopeResolver {
					elem: *elem,
					map: *map,
					collect: *collect,
					providers,
				}));
				self.resolvers
					.insert(*elem, Resolver::OnePerScope(Rc::clone(&per_scope)));
				self.resolvers
					.insert(*map, Resolver::MapOfOnePerScope(per_scope));
				let map_node = self.graph.type_node(*map);
				self.graph.set_comment(map_node, "one-per-scope");
				self.graph.add_edge(location_node, map_node);
				Ok(())
			}
			OutputSpec::PerScopeMap { map, elem } => Err(DiError::OnePerScopeReturn {
				key: *map,
				elem: *elem,
			}),
		}
	}

	fn append_to_resolver(
		&mut self,
		existing: Resolver,
		key: TypeKey,
		node: &Rc<RefCell<SimpleProvider>>,
		index: usize,
		output: &OutputSpec,
		location: &Location,
	) -> DiResult<()> {
		match existing {
			Resolver::Group(group) => {
				let split = match output {
					OutputSpec::GroupItems { split, .. } => Some(*split),
					_ => None,
				};
				let slice = group.borrow().slice;
				group.borrow_mut().providers.push(GroupEntry {
					node: Rc::clone(node),
					output_index: index,
					split,
				});
				let scope = node.borrow().scope.clone();
				let location_node = self.graph.location_node(location, scope.as_ref());
				let slice_node = self.graph.type_node(slice);
				self.graph.add_edge(location_node, slice_node);
				Ok(())
			}
			Resolver::OnePerScope(per_scope) => {
				let Some(scope) = node.borrow().scope.clone() else {
					return Err(DiError::OnePerScopeOutsideScope {
						key,
						location: location.clone(),
					});
				};
				if let Some(previous) = per_scope.borrow().providers.get(&scope) {
					return Err(DiError::DuplicateScopedProvision {
						key,
						scope: scope.name().to_string(),
						location: location.clone(),
						previous: previous.node.borrow().descriptor.location.to_string(),
					});
				}
				let map = per_scope.borrow().map;
				per_scope.borrow_mut().providers.insert(
					scope.clone(),
					ScopedEntry {
						node: Rc::clone(node),
						output_index: index,
					},
				);
				let location_node = self.graph.location_node(location, Some(&scope));
				let map_node = self.graph.type_node(map);
				self.graph.add_edge(location_node, map_node);
				Ok(())
			}
			Resolver::Supply(_)
			| Resolver::Simple(_)
			| Resolver::SliceGroup(_)
			| Resolver::MapOfOnePerScope(_)
			| Resolver::ScopeDep(_) => Err(DiError::DuplicateProvision {
				key,
				location: location.clone(),
				previous: existing.describe_location(),
			}),
		}
	}

	// ---- resolution ----

	pub(crate) fn resolve(
		&mut self,
		input: &InputSpec,
		scope: Option<&Scope>,
		caller: &Location,
	) -> DiResult<Value> {
		self.resolve_stack.push(ResolveFrame {
			caller: caller.clone(),
			key: input.key,
		});
		let result = self.resolve_inner(input, scope, caller);
		if result.is_ok() {
			self.resolve_stack.pop();
		}
		result
	}

	fn resolve_inner(
		&mut self,
		input: &InputSpec,
		scope: Option<&Scope>,
		caller: &Location,
	) -> DiResult<Value> {
		let type_node = self.graph.type_node(input.key);

		// The scope input is resolved by the engine itself.
		if input.key == TypeKey::of::<Scope>() {
			let Some(scope) = scope else {
				return Err(DiError::NotInScope {
					key: input.key,
					caller: caller.clone(),
				});
			};
			tracing::debug!(scope = scope.name(), "providing scope");
			self.graph.mark_used(type_node);
			return Ok(Value::new(scope.clone()));
		}

		let Some(resolver) = self.resolvers.get(&input.key).cloned() else {
			if input.optional {
				tracing::debug!(key = %input.key, "providing zero value for optional dependency");
				let Some(zero) = input.zero else {
					return Err(DiError::failure(format!(
						"optional input {} has no zero value constructor",
						input.key
					)));
				};
				return Ok(zero());
			}
			self.graph.mark_failed(type_node);
			return Err(DiError::UnresolvedDependency {
				key: input.key,
				caller: caller.clone(),
				stack: self.format_resolve_stack(),
			});
		};

		match self.resolve_with(&resolver, scope, caller) {
			Ok(value) => {
				self.graph.mark_used(type_node);
				Ok(value)
			}
			Err(error) => {
				self.graph.mark_failed(type_node);
				Err(error)
			}
		}
	}

	fn resolve_with(
		&mut self,
		resolver: &Resolver,
		scope: Option<&Scope>,
		caller: &Location,
	) -> DiResult<Value> {
		match resolver {
			Resolver::Supply(supply) => Ok(supply.value.clone()),
			Resolver::Simple(simple) => {
				let values = self.simple_provider_values(&simple.node)?;
				output_at(&values, simple.output_index)
			}
			Resolver::Group(group) => Err(DiError::GroupTypeRequested {
				key: group.borrow().elem,
			}),
			Resolver::SliceGroup(group) => self.assemble_group(group),
			Resolver::OnePerScope(per_scope) => Err(DiError::OnePerScopeTypeRequested {
				key: per_scope.borrow().elem,
			}),
			Resolver::MapOfOnePerScope(per_scope) => self.assemble_scope_map(per_scope),
			Resolver::ScopeDep(dep) => self.resolve_scope_dep(dep, scope, caller),
		}
	}

	/// Runs a simple provider if it has not run yet and returns all its
	/// outputs.
	fn simple_provider_values(&mut self, node: &Rc<RefCell<SimpleProvider>>) -> DiResult<Vec<Value>> {
		if let Some(values) = node.borrow().values.clone() {
			return Ok(values);
		}
		let (location, scope, inputs) = {
			let node = node.borrow();
			(
				node.descriptor.location.clone(),
				node.scope.clone(),
				node.descriptor.inputs.clone(),
			)
		};
		let input_values = self.resolve_call_inputs(&location, scope.as_ref(), &inputs)?;
		let result = node.borrow_mut().descriptor.func.call(input_values);
		let values = self.finish_call(&location, scope.as_ref(), result)?;
		node.borrow_mut().values = Some(values.clone());
		Ok(values)
	}

	fn assemble_group(&mut self, group: &Rc<RefCell<GroupResolver>>) -> DiResult<Value> {
		if let Some(value) = group.borrow().assembled.clone() {
			return Ok(value);
		}
		let (entries, collect) = {
			let group = group.borrow();
			(group.providers.clone(), group.collect)
		};
		let mut items = Vec::new();
		for entry in entries {
			let values = self.simple_provider_values(&entry.node)?;
			let value = output_at(&values, entry.output_index)?;
			match entry.split {
				Some(split) => items.extend(split(&value)?),
				None => items.push(value),
			}
		}
		let assembled = collect(items)?;
		group.borrow_mut().assembled = Some(assembled.clone());
		Ok(assembled)
	}

	fn assemble_scope_map(&mut self, per_scope: &Rc<RefCell<OnePerScopeResolver>>) -> DiResult<Value> {
		let (providers, collect) = {
			let per_scope = per_scope.borrow();
			let providers: Vec<(Scope, ScopedEntry)> = per_scope
				.providers
				.iter()
				.map(|(scope, entry)| (scope.clone(), entry.clone()))
				.collect();
			(providers, per_scope.collect)
		};
		let mut entries = Vec::with_capacity(providers.len());
		for (scope, entry) in providers {
			let values = self.simple_provider_values(&entry.node)?;
			let value = output_at(&values, entry.output_index)?;
			entries.push((scope.name().to_string(), value));
		}
		collect(entries)
	}

	fn resolve_scope_dep(
		&mut self,
		dep: &ScopeDepResolver,
		scope: Option<&Scope>,
		caller: &Location,
	) -> DiResult<Value> {
		let Some(scope) = scope else {
			return Err(DiError::NotInScope {
				key: dep.key,
				caller: caller.clone(),
			});
		};
		if let Some(values) = dep.node.borrow().values_by_scope.get(scope) {
			return output_at(values, dep.output_index);
		}
		let (location, inputs) = {
			let node = dep.node.borrow();
			(
				node.descriptor.location.clone(),
				node.descriptor.inputs.clone(),
			)
		};
		let input_values = self.resolve_call_inputs(&location, Some(scope), &inputs)?;
		let result = dep.node.borrow_mut().descriptor.func.call(input_values);
		let values = self.finish_call(&location, Some(scope), result)?;
		dep.node
			.borrow_mut()
			.values_by_scope
			.insert(scope.clone(), values.clone());
		output_at(&values, dep.output_index)
	}

	/// Cycle bookkeeping and input resolution shared by every provider
	/// invocation.
	fn resolve_call_inputs(
		&mut self,
		location: &Location,
		scope: Option<&Scope>,
		inputs: &[InputSpec],
	) -> DiResult<Vec<Value>> {
		let location_node = self.graph.location_node(location, scope);
		self.graph.mark_failed(location_node);

		let frame = CallerFrame {
			location: location.clone(),
			scope: scope.cloned(),
		};
		if self.caller_set.contains(&frame) {
			return Err(DiError::CyclicDependency {
				chain: self.cycle_chain(&frame),
			});
		}
		self.caller_set.insert(frame.clone());
		self.caller_stack.push(frame.clone());

		let span = tracing::debug_span!("resolving", provider = %location);
		let guard = span.enter();

		let mut values = Vec::with_capacity(inputs.len());
		let mut failure = None;
		for input in inputs {
			match self.resolve(input, scope, location) {
				Ok(value) => values.push(value),
				Err(error) => {
					failure = Some(error);
					break;
				}
			}
		}

		drop(guard);
		self.caller_set.remove(&frame);
		self.caller_stack.pop();

		match failure {
			Some(error) => Err(error),
			None => {
				tracing::debug!(provider = %location, "calling provider");
				Ok(values)
			}
		}
	}

	/// Wraps a provider's own error with its location and colors the graph
	/// node.
	fn finish_call(
		&mut self,
		location: &Location,
		scope: Option<&Scope>,
		result: DiResult<Vec<Value>>,
	) -> DiResult<Vec<Value>> {
		match result {
			Ok(values) => {
				let location_node = self.graph.location_node(location, scope);
				self.graph.mark_used(location_node);
				Ok(values)
			}
			Err(source) => Err(DiError::ProviderFailed {
				location: location.clone(),
				source: Box::new(source),
			}),
		}
	}

	fn cycle_chain(&self, frame: &CallerFrame) -> String {
		let mut names: Vec<&str> = self
			.caller_stack
			.iter()
			.skip_while(|candidate| *candidate != frame)
			.map(|candidate| candidate.location.name())
			.collect();
		names.push(frame.location.name());
		names.join(" -> ")
	}

	fn format_resolve_stack(&self) -> String {
		let mut out = String::from("\twhile resolving:\n");
		for frame in self.resolve_stack.iter().rev() {
			let _ = writeln!(out, "\t\t{} for {}", frame.key, frame.caller);
		}
		out
	}
}

impl Default for Container {
	fn default() -> Self {
		Self::new()
	}
}

fn output_at(values: &[Value], index: usize) -> DiResult<Value> {
	values.get(index).cloned().ok_or_else(|| {
		DiError::failure(format!(
			"provider produced {} outputs, wanted output {}",
			values.len(),
			index
		))
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_scope_lookup_is_idempotent() {
		let mut container = Container::new();
		let first = container.scope("request");
		let second = container.scope("request");
		assert_eq!(first, second);
		assert_ne!(first, container.scope("session"));
	}

	#[rstest]
	fn test_resolve_stack_formatting() {
		let mut container = Container::new();
		container.resolve_stack.push(ResolveFrame {
			caller: Location::for_function::<fn()>(panic::Location::caller()),
			key: TypeKey::of::<u32>(),
		});
		let formatted = container.format_resolve_stack();
		assert!(formatted.starts_with("\twhile resolving:"));
		assert!(formatted.contains("u32 for "));
	}
}
