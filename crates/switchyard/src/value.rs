//! Type-erased value carrier.

use crate::error::{DiError, DiResult};
use crate::key::TypeKey;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// A runtime value paired with its [`TypeKey`].
///
/// Values are produced by providers and consumed as provider inputs. The
/// payload sits behind an `Rc` so one provider call can feed any number of
/// consumers; [`Value::extract`] clones the payload out, which is why every
/// injectable type must be `Clone`.
#[derive(Clone)]
pub struct Value {
	key: TypeKey,
	inner: Rc<dyn Any>,
}

impl Value {
	/// Wraps a concrete value.
	pub fn new<T: Clone + 'static>(value: T) -> Self {
		Self {
			key: TypeKey::of::<T>(),
			inner: Rc::new(value),
		}
	}

	/// The key of the carried type.
	pub fn key(&self) -> TypeKey {
		self.key
	}

	/// Clones the payload out as `T`.
	pub fn extract<T: Clone + 'static>(&self) -> DiResult<T> {
		self.inner
			.downcast_ref::<T>()
			.cloned()
			.ok_or_else(|| DiError::TypeMismatch {
				expected: TypeKey::of::<T>(),
				actual: self.key,
			})
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Value").field(&self.key.name()).finish()
	}
}
