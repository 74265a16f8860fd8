//! Error types for container registration and resolution.

use crate::key::TypeKey;
use crate::location::Location;
use thiserror::Error;

/// Result type alias for container operations.
pub type DiResult<T> = Result<T, DiError>;

/// Errors raised while registering providers or resolving dependencies.
#[derive(Debug, Error)]
pub enum DiError {
	/// A required input has no registered resolver.
	///
	/// Carries the formatted resolution stack so the failing dependency
	/// chain can be read top-down.
	#[error("can't resolve type {key} for {caller}:\n{stack}")]
	UnresolvedDependency {
		/// The type that could not be resolved.
		key: TypeKey,
		/// The provider that requested it.
		caller: Location,
		/// Formatted resolution stack, innermost request first.
		stack: String,
	},

	/// A provider's location was re-entered while its inputs were still
	/// being resolved.
	#[error("cyclic dependency: {chain}")]
	CyclicDependency {
		/// Provider names along the cycle, e.g. `a -> b -> a`.
		chain: String,
	},

	/// Two providers claim the same non-group, non-one-per-scope type.
	#[error("duplicate provision of type {key} by {location}\n\talready provided by {previous}")]
	DuplicateProvision {
		/// The doubly-provided type.
		key: TypeKey,
		/// The rejected registration.
		location: Location,
		/// Description of the registration that already owns the type.
		previous: String,
	},

	/// A second provider of a one-per-scope type was registered for a scope
	/// that already has one.
	#[error("duplicate provision of one-per-scope type {key} in scope {scope} by {location}\n\talready provided by {previous}")]
	DuplicateScopedProvision {
		/// The one-per-scope element type.
		key: TypeKey,
		/// Name of the contested scope.
		scope: String,
		/// The rejected registration.
		location: Location,
		/// The registration that already owns the scope.
		previous: String,
	},

	/// A scoped provider declared an output type that some other resolver
	/// already owns.
	#[error("duplicate provision of type {key} by scoped provider {location}\n\talready provided by {previous}")]
	ScopedProviderConflict {
		/// The contested type.
		key: TypeKey,
		/// The rejected scoped provider.
		location: Location,
		/// Description of the existing owner.
		previous: String,
	},

	/// A provider returned the synthesized `HashMap<String, T>` form of a
	/// one-per-scope type, which only the container may produce.
	#[error("{key} cannot be used as a return type because {elem} is a one-per-scope type")]
	OnePerScopeReturn {
		/// The illegal map return type.
		key: TypeKey,
		/// The one-per-scope element type.
		elem: TypeKey,
	},

	/// A provider of a one-per-scope type was registered without a scope
	/// binding.
	#[error("one-per-scope type {key} can only be provided within a scope: {location}")]
	OnePerScopeOutsideScope {
		/// The one-per-scope element type.
		key: TypeKey,
		/// The rejected registration.
		location: Location,
	},

	/// An auto-group element type was requested directly instead of through
	/// its slice form.
	#[error("auto-group type {key} cannot be resolved directly, resolve Vec<{key}> instead")]
	GroupTypeRequested {
		/// The auto-group element type.
		key: TypeKey,
	},

	/// A one-per-scope element type was requested directly instead of
	/// through its map form.
	#[error("one-per-scope type {key} cannot be resolved directly, resolve HashMap<String, {key}> instead")]
	OnePerScopeTypeRequested {
		/// The one-per-scope element type.
		key: TypeKey,
	},

	/// A scope-dependent value was requested while no scope was active.
	#[error("trying to resolve {key} for {caller} but not inside of any scope")]
	NotInScope {
		/// The requested type.
		key: TypeKey,
		/// The provider that requested it.
		caller: Location,
	},

	/// `run` was handed a function with output values other than an error.
	#[error("invoker function cannot have return values other than an error: {location}")]
	InvalidInvoker {
		/// The rejected invoker.
		location: Location,
	},

	/// `run` was handed a function that would register as a scoped provider.
	#[error("cannot run a scoped provider as an invoker: {location}")]
	ScopedInvoker {
		/// The rejected invoker.
		location: Location,
	},

	/// A provider function returned an error.
	#[error("error calling provider {location}: {source}")]
	ProviderFailed {
		/// The failing provider.
		location: Location,
		/// The provider's own error.
		#[source]
		source: Box<DiError>,
	},

	/// A stored value did not hold the type it was expected to hold.
	///
	/// Indicates a bookkeeping defect in the container rather than a wiring
	/// mistake.
	#[error("value of type {actual} cannot be downcast to {expected}")]
	TypeMismatch {
		/// The type the caller asked for.
		expected: TypeKey,
		/// The type the value actually holds.
		actual: TypeKey,
	},

	/// A free-form failure, typically raised by user constructors.
	#[error("{0}")]
	Failure(String),
}

impl DiError {
	/// Creates a free-form failure error.
	pub fn failure(message: impl Into<String>) -> Self {
		Self::Failure(message.into())
	}
}

impl From<String> for DiError {
	fn from(message: String) -> Self {
		Self::Failure(message)
	}
}

impl From<&str> for DiError {
	fn from(message: &str) -> Self {
		Self::Failure(message.to_string())
	}
}
