//! Provider descriptors and the traits that extract them from functions.
//!
//! A provider is an ordinary function or closure. Registration turns it
//! into a [`ProviderDescriptor`]: the typed shape of its inputs and
//! outputs plus a type-erased callable. The extraction is driven by three
//! traits, each generic over a marker type so their blanket impls stay
//! coherent:
//!
//! - [`Dependency`] describes one input position: any [`Injectable`] type,
//!   [`Optional<T>`] for inputs that may be missing, or [`Scope`] for the
//!   scope a provider is constructed in.
//! - [`ProviderOutput`] describes the return value: a single injectable
//!   value, a tuple of them, `()`, or a `Result` of any of those; the
//!   `Err` arm is the provider's error channel.
//! - [`ProviderFunction`] ties both together for functions of up to eight
//!   inputs.

use crate::error::{DiError, DiResult};
use crate::key::TypeKey;
use crate::location::Location;
use crate::scope::Scope;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

/// How a type participates in resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeClass {
	/// Exactly one provider may own the type.
	Simple,
	/// All providers of the type are aggregated into a `Vec` at the type
	/// boundary.
	AutoGroup,
	/// One provider per scope; consumed as `HashMap<String, T>`.
	OnePerScope,
}

/// Types that can flow through the container.
///
/// Every provided or injected type implements this trait. The default
/// classification is [`TypeClass::Simple`]; aggregate types override
/// [`type_class`](Injectable::type_class):
///
/// ```
/// use switchyard::{Injectable, TypeClass};
///
/// #[derive(Clone)]
/// struct Route;
///
/// impl Injectable for Route {
/// 	fn type_class() -> TypeClass {
/// 		TypeClass::AutoGroup
/// 	}
/// }
/// ```
pub trait Injectable: Clone + 'static {
	/// How the container aggregates providers of this type.
	fn type_class() -> TypeClass {
		TypeClass::Simple
	}

	#[doc(hidden)]
	fn output_spec() -> OutputSpec {
		match Self::type_class() {
			TypeClass::Simple => OutputSpec::Simple {
				key: TypeKey::of::<Self>(),
			},
			TypeClass::AutoGroup => OutputSpec::Group {
				elem: TypeKey::of::<Self>(),
				slice: TypeKey::of::<Vec<Self>>(),
				collect: collect_group::<Self>,
			},
			TypeClass::OnePerScope => OutputSpec::PerScope {
				elem: TypeKey::of::<Self>(),
				map: TypeKey::of::<HashMap<String, Self>>(),
				collect: collect_scope_map::<Self>,
			},
		}
	}
}

/// Providing a `Vec<T>` of an auto-group type means providing individual
/// elements in bulk; for any other element type the vector is an ordinary
/// simple type.
impl<T: Injectable> Injectable for Vec<T> {
	fn output_spec() -> OutputSpec {
		match T::type_class() {
			TypeClass::AutoGroup => OutputSpec::GroupItems {
				elem: TypeKey::of::<T>(),
				slice: TypeKey::of::<Vec<T>>(),
				collect: collect_group::<T>,
				split: split_group::<T>,
			},
			_ => OutputSpec::Simple {
				key: TypeKey::of::<Vec<T>>(),
			},
		}
	}
}

/// The `HashMap<String, T>` form of a one-per-scope type is synthesized by
/// the container and rejected as a provider return type; for any other
/// value type the map is an ordinary simple type.
impl<T: Injectable> Injectable for HashMap<String, T> {
	fn output_spec() -> OutputSpec {
		match T::type_class() {
			TypeClass::OnePerScope => OutputSpec::PerScopeMap {
				map: TypeKey::of::<HashMap<String, T>>(),
				elem: TypeKey::of::<T>(),
			},
			_ => OutputSpec::Simple {
				key: TypeKey::of::<HashMap<String, T>>(),
			},
		}
	}
}

macro_rules! simple_injectable {
	($($ty:ty),* $(,)?) => {
		$(impl Injectable for $ty {})*
	};
}

simple_injectable!(
	bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
	&'static str,
);

/// Builds a `Vec<T>` value from accumulated group elements.
fn collect_group<T: Injectable>(items: Vec<Value>) -> DiResult<Value> {
	let mut out = Vec::with_capacity(items.len());
	for item in items {
		out.push(item.extract::<T>()?);
	}
	Ok(Value::new(out))
}

/// Splits a bulk `Vec<T>` output into individual group elements.
fn split_group<T: Injectable>(value: &Value) -> DiResult<Vec<Value>> {
	Ok(value
		.extract::<Vec<T>>()?
		.into_iter()
		.map(Value::new)
		.collect())
}

/// Builds a `HashMap<String, T>` value from per-scope entries.
fn collect_scope_map<T: Injectable>(entries: Vec<(String, Value)>) -> DiResult<Value> {
	let mut out = HashMap::with_capacity(entries.len());
	for (name, value) in entries {
		out.insert(name, value.extract::<T>()?);
	}
	Ok(Value::new(out))
}

fn zero_value<T: Injectable + Default>() -> Value {
	Value::new(T::default())
}

/// Monomorphized constructor of a collection value from element values.
pub type CollectFn = fn(Vec<Value>) -> DiResult<Value>;
/// Monomorphized splitter of a bulk output into element values.
pub type SplitFn = fn(&Value) -> DiResult<Vec<Value>>;
/// Monomorphized constructor of a scope map value from named entries.
pub type CollectMapFn = fn(Vec<(String, Value)>) -> DiResult<Value>;
/// Monomorphized constructor of a type's zero value.
pub type ZeroFn = fn() -> Value;

/// The typed shape of one provider input.
#[derive(Clone, Copy, Debug)]
pub struct InputSpec {
	/// The requested type.
	pub key: TypeKey,
	/// Whether a missing resolver yields the type's zero value instead of
	/// an error.
	pub optional: bool,
	pub(crate) zero: Option<ZeroFn>,
}

/// The typed shape of one provider output.
#[derive(Clone, Copy, Debug)]
pub enum OutputSpec {
	/// A plain value owned by a single provider.
	Simple {
		/// The provided type.
		key: TypeKey,
	},
	/// One element of an auto-group type.
	Group {
		/// The element type.
		elem: TypeKey,
		/// The synthesized `Vec<T>` type.
		slice: TypeKey,
		/// Builds the slice value from accumulated elements.
		collect: CollectFn,
	},
	/// A bulk `Vec<T>` of auto-group elements, flattened into the group.
	GroupItems {
		/// The element type.
		elem: TypeKey,
		/// The `Vec<T>` type as returned.
		slice: TypeKey,
		/// Builds the slice value from accumulated elements.
		collect: CollectFn,
		/// Splits this output into individual elements.
		split: SplitFn,
	},
	/// One per-scope element of a one-per-scope type.
	PerScope {
		/// The element type.
		elem: TypeKey,
		/// The synthesized `HashMap<String, T>` type.
		map: TypeKey,
		/// Builds the map value from named entries.
		collect: CollectMapFn,
	},
	/// The synthesized map form of a one-per-scope type; illegal as a
	/// provider return type.
	PerScopeMap {
		/// The map type.
		map: TypeKey,
		/// The one-per-scope element type.
		elem: TypeKey,
	},
}

impl OutputSpec {
	/// The key this output registers under, with bulk auto-group outputs
	/// unwrapped to their element type.
	pub fn key(&self) -> TypeKey {
		match self {
			Self::Simple { key } => *key,
			Self::Group { elem, .. } | Self::GroupItems { elem, .. } => *elem,
			Self::PerScope { elem, .. } => *elem,
			Self::PerScopeMap { map, .. } => *map,
		}
	}

	/// The output type exactly as the provider declared it, with no
	/// auto-group unwrapping. Scoped providers and supplied values register
	/// raw types.
	pub(crate) fn raw_key(&self) -> TypeKey {
		match self {
			Self::Simple { key } => *key,
			Self::Group { elem, .. } => *elem,
			Self::GroupItems { slice, .. } => *slice,
			Self::PerScope { elem, .. } => *elem,
			Self::PerScopeMap { map, .. } => *map,
		}
	}
}

/// Type-erased provider callable.
pub struct ProviderFn(Box<dyn FnMut(Vec<Value>) -> DiResult<Vec<Value>>>);

impl ProviderFn {
	/// Wraps an erased callable.
	pub fn new(func: impl FnMut(Vec<Value>) -> DiResult<Vec<Value>> + 'static) -> Self {
		Self(Box::new(func))
	}

	pub(crate) fn call(&mut self, inputs: Vec<Value>) -> DiResult<Vec<Value>> {
		(self.0)(inputs)
	}
}

impl fmt::Debug for ProviderFn {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("ProviderFn")
	}
}

/// A provider's extracted shape: location, typed inputs and outputs, and
/// the erased callable. Immutable after extraction.
#[derive(Debug)]
pub struct ProviderDescriptor {
	/// Where the provider was registered.
	pub location: Location,
	/// Input shapes, in parameter order.
	pub inputs: Vec<InputSpec>,
	/// Output shapes, in return order.
	pub outputs: Vec<OutputSpec>,
	pub(crate) func: ProviderFn,
}

/// Wrapper for provider inputs that may be missing.
///
/// When no resolver owns `T`, an `Optional<T>` input receives `T::default()`
/// instead of failing resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Optional<T>(pub T);

impl<T> Optional<T> {
	/// Unwraps the carried value.
	pub fn into_inner(self) -> T {
		self.0
	}
}

impl<T> Deref for Optional<T> {
	type Target = T;

	fn deref(&self) -> &T {
		&self.0
	}
}

impl<T> DerefMut for Optional<T> {
	fn deref_mut(&mut self) -> &mut T {
		&mut self.0
	}
}

#[doc(hidden)]
pub struct RequiredDep;
#[doc(hidden)]
pub struct OptionalDep;
#[doc(hidden)]
pub struct ScopeParam;

/// One input position of a provider function.
///
/// Implemented for every [`Injectable`] type (required input), for
/// [`Optional<T>`] (zero value when unresolvable) and for [`Scope`] (the
/// scope the provider is constructed in). The marker parameter only keeps
/// the blanket impls apart.
pub trait Dependency<Marker>: Sized + 'static {
	#[doc(hidden)]
	fn input_spec() -> InputSpec;

	#[doc(hidden)]
	fn extract(value: Value) -> DiResult<Self>;
}

impl<T: Injectable> Dependency<RequiredDep> for T {
	fn input_spec() -> InputSpec {
		InputSpec {
			key: TypeKey::of::<T>(),
			optional: false,
			zero: None,
		}
	}

	fn extract(value: Value) -> DiResult<Self> {
		value.extract()
	}
}

impl<T: Injectable + Default> Dependency<OptionalDep> for Optional<T> {
	fn input_spec() -> InputSpec {
		InputSpec {
			key: TypeKey::of::<T>(),
			optional: true,
			zero: Some(zero_value::<T>),
		}
	}

	fn extract(value: Value) -> DiResult<Self> {
		Ok(Optional(value.extract()?))
	}
}

impl Dependency<ScopeParam> for Scope {
	fn input_spec() -> InputSpec {
		InputSpec {
			key: TypeKey::of::<Scope>(),
			optional: false,
			zero: None,
		}
	}

	fn extract(value: Value) -> DiResult<Self> {
		value.extract()
	}
}

#[doc(hidden)]
pub struct ValueOutput;
#[doc(hidden)]
pub struct TupleOutput;
#[doc(hidden)]
pub struct FallibleOutput<M>(PhantomData<M>);

/// The return value of a provider function.
///
/// Implemented for a single [`Injectable`] value, for `()`, for tuples of
/// up to four injectable values, and for `Result<O, E>` where `O` is any of
/// the former. The `Err` arm becomes the provider's error channel rather
/// than a provided value.
pub trait ProviderOutput<Marker>: 'static {
	#[doc(hidden)]
	fn output_specs() -> Vec<OutputSpec>;

	#[doc(hidden)]
	fn into_values(self) -> DiResult<Vec<Value>>;
}

impl<T: Injectable> ProviderOutput<ValueOutput> for T {
	fn output_specs() -> Vec<OutputSpec> {
		vec![T::output_spec()]
	}

	fn into_values(self) -> DiResult<Vec<Value>> {
		Ok(vec![Value::new(self)])
	}
}

impl ProviderOutput<TupleOutput> for () {
	fn output_specs() -> Vec<OutputSpec> {
		Vec::new()
	}

	fn into_values(self) -> DiResult<Vec<Value>> {
		Ok(Vec::new())
	}
}

macro_rules! impl_tuple_output {
	($($name:ident),+) => {
		impl<$($name: Injectable),+> ProviderOutput<TupleOutput> for ($($name,)+) {
			fn output_specs() -> Vec<OutputSpec> {
				vec![$($name::output_spec()),+]
			}

			#[allow(non_snake_case)]
			fn into_values(self) -> DiResult<Vec<Value>> {
				let ($($name,)+) = self;
				Ok(vec![$(Value::new($name)),+])
			}
		}
	};
}

impl_tuple_output!(A, B);
impl_tuple_output!(A, B, C);
impl_tuple_output!(A, B, C, D);

impl<O, E, M> ProviderOutput<FallibleOutput<M>> for Result<O, E>
where
	O: ProviderOutput<M>,
	E: Into<DiError> + 'static,
{
	fn output_specs() -> Vec<OutputSpec> {
		O::output_specs()
	}

	fn into_values(self) -> DiResult<Vec<Value>> {
		match self {
			Ok(output) => output.into_values(),
			Err(error) => Err(error.into()),
		}
	}
}

/// Functions and closures that can be registered as providers.
///
/// Implemented for functions of up to eight [`Dependency`] inputs returning
/// a [`ProviderOutput`]. The marker parameter is inferred; callers never
/// name it.
pub trait ProviderFunction<Marker>: 'static {
	#[doc(hidden)]
	fn descriptor(self, location: Location) -> ProviderDescriptor;
}

impl<Func, Out, OutMarker> ProviderFunction<(OutMarker, Out)> for Func
where
	Func: FnMut() -> Out + 'static,
	Out: ProviderOutput<OutMarker>,
{
	fn descriptor(mut self, location: Location) -> ProviderDescriptor {
		ProviderDescriptor {
			location,
			inputs: Vec::new(),
			outputs: Out::output_specs(),
			func: ProviderFn::new(move |_values| (self)().into_values()),
		}
	}
}

macro_rules! impl_provider_function {
	($($dep:ident : $marker:ident),+) => {
		impl<Func, Out, OutMarker, $($dep, $marker),+> ProviderFunction<(OutMarker, Out, $(($dep, $marker)),+)> for Func
		where
			Func: FnMut($($dep),+) -> Out + 'static,
			Out: ProviderOutput<OutMarker>,
			$($dep: Dependency<$marker>),+
		{
			#[allow(non_snake_case)]
			fn descriptor(mut self, location: Location) -> ProviderDescriptor {
				ProviderDescriptor {
					location,
					inputs: vec![$($dep::input_spec()),+],
					outputs: Out::output_specs(),
					func: ProviderFn::new(move |values: Vec<Value>| {
						let mut values = values.into_iter();
						$(
							let $dep = match values.next() {
								Some(value) => $dep::extract(value)?,
								None => return Err(DiError::failure("provider invoked with too few inputs")),
							};
						)+
						(self)($($dep),+).into_values()
					}),
				}
			}
		}
	};
}

impl_provider_function!(D1: M1);
impl_provider_function!(D1: M1, D2: M2);
impl_provider_function!(D1: M1, D2: M2, D3: M3);
impl_provider_function!(D1: M1, D2: M2, D3: M3, D4: M4);
impl_provider_function!(D1: M1, D2: M2, D3: M3, D4: M4, D5: M5);
impl_provider_function!(D1: M1, D2: M2, D3: M3, D4: M4, D5: M5, D6: M6);
impl_provider_function!(D1: M1, D2: M2, D3: M3, D4: M4, D5: M5, D6: M6, D7: M7);
impl_provider_function!(D1: M1, D2: M2, D3: M3, D4: M4, D5: M5, D6: M6, D7: M7, D8: M8);
