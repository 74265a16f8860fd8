//! Runtime dependency-injection container.
//!
//! Switchyard wires constructor functions ("providers") into a directed
//! acyclic graph keyed by runtime type identity, resolves an entry-point
//! function by constructing all of its transitive inputs exactly once, and
//! detects wiring mistakes (missing providers, duplicate provisions,
//! cyclic dependencies, illegal return shapes) at registration time or
//! eagerly during resolution.
//!
//! # Quick start
//!
//! ```
//! use switchyard::{Container, DiResult, Injectable};
//!
//! #[derive(Clone)]
//! struct Config {
//! 	url: String,
//! }
//!
//! #[derive(Clone)]
//! struct Client {
//! 	url: String,
//! }
//!
//! impl Injectable for Config {}
//! impl Injectable for Client {}
//!
//! fn main() -> DiResult<()> {
//! 	let mut container = Container::new();
//! 	container.provide(|| Config { url: "localhost:5432".to_string() })?;
//! 	container.provide(|config: Config| Client { url: config.url })?;
//! 	container.run(|client: Client| -> DiResult<()> {
//! 		assert_eq!(client.url, "localhost:5432");
//! 		Ok(())
//! 	})
//! }
//! ```
//!
//! # Provider shapes
//!
//! Providers are plain functions or closures. Inputs may be any
//! [`Injectable`] type, [`Optional<T>`] (resolved to `T::default()` when
//! nothing provides `T`), or [`Scope`]. Outputs may be a single value, a
//! tuple of values, or a `Result` of either; the `Err` arm is the
//! provider's error channel and never registers as a provided type.
//!
//! # Aggregate types
//!
//! A type classified [`TypeClass::AutoGroup`] may have any number of
//! providers; consumers request `Vec<T>` and receive every provided element
//! in registration order. A type classified [`TypeClass::OnePerScope`] takes
//! one provider per named scope (via
//! [`provide_in_scope`](Container::provide_in_scope)); consumers request
//! `HashMap<String, T>` keyed by scope name. In both cases the element type
//! itself cannot be requested directly.
//!
//! # Scopes
//!
//! A provider registered with [`provide_in_scope`](Container::provide_in_scope)
//! is bound to a named [`Scope`]; a provider that takes `Scope` as an input
//! without such a binding becomes a *scoped provider*, invoked once per
//! scope it is resolved under.
//!
//! # Diagnostics
//!
//! The container maintains a shadow graph of types and providers, colored
//! as resolution succeeds or fails; [`render_graph`](Container::render_graph)
//! writes it in GraphViz DOT form.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod container;
pub mod error;
pub mod key;
pub mod location;
pub mod provider;
pub mod scope;
pub mod value;

mod graph;
mod node;
mod resolver;

pub use container::Container;
pub use error::{DiError, DiResult};
pub use key::TypeKey;
pub use location::Location;
pub use provider::{
	Dependency, Injectable, InputSpec, Optional, OutputSpec, ProviderDescriptor, ProviderFn,
	ProviderFunction, ProviderOutput, TypeClass,
};
pub use scope::Scope;
pub use value::Value;
