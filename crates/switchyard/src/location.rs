//! Provider source locations for diagnostics.

use crate::key::TypeKey;
use std::fmt;
use std::panic;

/// Human-readable identity of a provider registration.
///
/// Combines the provider function's type path (closures carry the path of
/// the enclosing function) with the registration call site. Locations
/// compare by value; besides diagnostics they key the cycle-detection
/// bookkeeping, so two registrations at different call sites are always
/// distinct even when their names collide.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Location {
	name: String,
	file: &'static str,
	line: u32,
}

impl Location {
	/// Builds the location of a provider function registered at `caller`.
	pub(crate) fn for_function<F>(caller: &'static panic::Location<'static>) -> Self {
		Self {
			name: clean_function_name(std::any::type_name::<F>()),
			file: caller.file(),
			line: caller.line(),
		}
	}

	/// Builds the location of a supplied value registered at `caller`.
	pub(crate) fn for_supplied(key: TypeKey, caller: &'static panic::Location<'static>) -> Self {
		Self {
			name: format!("supply({})", key.name()),
			file: caller.file(),
			line: caller.line(),
		}
	}

	/// The provider's name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Source file of the registration call.
	pub fn file(&self) -> &str {
		self.file
	}

	/// Source line of the registration call.
	pub fn line(&self) -> u32 {
		self.line
	}
}

impl fmt::Display for Location {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} ({}:{})", self.name, self.file, self.line)
	}
}

/// Strips the `{{closure}}` suffixes rustc appends to closure type paths.
fn clean_function_name(raw: &str) -> String {
	let mut name = raw;
	while let Some(stripped) = name.strip_suffix("::{{closure}}") {
		name = stripped;
	}
	name.to_string()
}
