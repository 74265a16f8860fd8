//! Runtime type identity.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime-comparable identity of a Rust type.
///
/// `TypeKey` is the map key used throughout the container: resolvers,
/// diagnostic graph nodes and resolution frames are all keyed by it.
/// Equality and hashing consider only the [`TypeId`]; the captured type
/// name exists purely for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
	id: TypeId,
	name: &'static str,
}

impl TypeKey {
	/// Captures the key of a concrete type.
	pub fn of<T: 'static>() -> Self {
		Self {
			id: TypeId::of::<T>(),
			name: type_name::<T>(),
		}
	}

	/// The full path name of the keyed type.
	pub fn name(&self) -> &'static str {
		self.name
	}
}

impl PartialEq for TypeKey {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl fmt::Debug for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("TypeKey").field(&self.name).finish()
	}
}

impl fmt::Display for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_same_type_same_key() {
		assert_eq!(TypeKey::of::<String>(), TypeKey::of::<String>());
	}

	#[rstest]
	fn test_distinct_types_distinct_keys() {
		assert_ne!(TypeKey::of::<String>(), TypeKey::of::<u32>());
		assert_ne!(TypeKey::of::<Vec<u32>>(), TypeKey::of::<u32>());
	}

	#[rstest]
	fn test_display_uses_type_name() {
		assert_eq!(TypeKey::of::<u32>().to_string(), "u32");
	}
}
