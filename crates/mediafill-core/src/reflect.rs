//! Dynamic value access
//!
//! [`Reflect`] is the object-safe counterpart of [`Typed`]: where `Typed`
//! describes a type, `Reflect` exposes a concrete value so the tree walker can
//! read a source and write a destination without knowing either type.
//!
//! Implementations are provided for:
//! - `bool`, every integer width, `f32`, `f64`, `String`
//! - opaque scalars: `chrono::DateTime<Utc>`, `NaiveDate`, `NaiveDateTime`, `uuid::Uuid`
//! - `Option<T>`, `Box<T>` (indirection)
//! - `Vec<T>`, `HashMap<K, V>`, `BTreeMap<K, V>`
//!
//! Records get theirs from [`media_record!`](crate::media_record).

use crate::shape::{OpaqueType, ScalarKind, Shape, Typed};
use std::any::Any;
use std::collections::btree_map::Entry as BTreeEntry;
use std::collections::hash_map::Entry as HashEntry;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Scalar value read from a source
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    /// Boolean
    Bool(bool),
    /// Any signed integer, widened
    Signed(i64),
    /// Any unsigned integer, widened
    Unsigned(u64),
    /// Any float, widened
    Float(f64),
    /// Text
    Text(&'a str),
}

/// Read-only view of a value
pub enum ValueRef<'a> {
    /// Plain scalar
    Scalar(Scalar<'a>),
    /// Opaque scalar
    Opaque(&'a dyn Any),
    /// Empty indirection (`None`)
    Absent,
    /// Present indirection
    Indirect(&'a dyn Reflect),
    /// Sequence
    Sequence(&'a dyn SequenceValue),
    /// Keyed mapping
    Mapping(&'a dyn MappingValue),
    /// Record
    Record(&'a dyn RecordValue),
}

/// Mutable view of a value
pub enum ValueMut<'a> {
    /// Plain scalar
    Scalar(&'a mut dyn ScalarSlot),
    /// Opaque scalar
    Opaque(&'a mut dyn OpaqueSlot),
    /// Indirection, present or not
    Indirect(&'a mut dyn IndirectValue),
    /// Sequence
    Sequence(&'a mut dyn SequenceValue),
    /// Keyed mapping
    Mapping(&'a mut dyn MappingValue),
    /// Record
    Record(&'a mut dyn RecordValue),
}

/// Object-safe dynamic access to a value
pub trait Reflect: Any + Send + Sync {
    /// Upcast for downcasting to the concrete type
    fn as_any(&self) -> &dyn Any;

    /// Read-only view
    fn value(&self) -> ValueRef<'_>;

    /// Mutable view
    fn value_mut(&mut self) -> ValueMut<'_>;
}

/// Writable scalar
pub trait ScalarSlot {
    /// Store `value`, converting between numeric kinds or text kinds
    ///
    /// Returns `false` (leaving `self` untouched) when no conversion exists.
    fn set(&mut self, value: Scalar<'_>) -> bool;

    /// Text storage, for text-backed slots
    fn text_mut(&mut self) -> Option<&mut String> {
        None
    }
}

/// Writable opaque scalar
pub trait OpaqueSlot {
    /// Copy from `source` if it has the identical type
    fn assign_from(&mut self, source: &dyn Any) -> bool;
}

/// Owned reference (`Option<T>`, `Box<T>`)
pub trait IndirectValue {
    /// Inner value if present
    fn get_mut(&mut self) -> Option<&mut dyn Reflect>;

    /// Inner value, allocating a default one if absent
    fn get_or_insert_default(&mut self) -> &mut dyn Reflect;
}

/// Ordered sequence
pub trait SequenceValue {
    /// Number of elements
    fn len(&self) -> usize;

    /// Whether the sequence is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`
    fn get(&self, index: usize) -> Option<&dyn Reflect>;

    /// Mutable element at `index`
    fn get_mut(&mut self, index: usize) -> Option<&mut dyn Reflect>;

    /// Replace contents with `len` default elements
    fn reset(&mut self, len: usize);
}

/// Keyed mapping
pub trait MappingValue {
    /// Number of entries
    fn len(&self) -> usize;

    /// Whether the mapping is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries, in the mapping's own order
    fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_>;

    /// All values, mutably
    fn values_mut(&mut self) -> Box<dyn Iterator<Item = &mut dyn Reflect> + '_>;

    /// Remove all entries
    fn clear(&mut self);

    /// Insert a default value under a copy of `key`
    ///
    /// Returns `None` when `key` cannot be represented as this mapping's key
    /// type, or when its converted form is already present: two source keys
    /// are never merged into one entry.
    fn insert_default(&mut self, key: &dyn Reflect) -> Option<&mut dyn Reflect>;
}

/// Record with indexed fields
pub trait RecordValue {
    /// Field at declaration index
    fn field(&self, index: usize) -> Option<&dyn Reflect>;

    /// Mutable field at declaration index
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Reflect>;
}

/// Strip indirection from a value; `None` when any level is absent
#[must_use]
pub fn deref_value(value: &dyn Reflect) -> Option<&dyn Reflect> {
    match value.value() {
        ValueRef::Absent => None,
        ValueRef::Indirect(inner) => deref_value(inner),
        _ => Some(value),
    }
}

/// Text content of a value after stripping indirection
#[must_use]
pub fn text_of(value: &dyn Reflect) -> Option<&str> {
    match deref_value(value)?.value() {
        ValueRef::Scalar(Scalar::Text(text)) => Some(text),
        _ => None,
    }
}

/// Scalar copy: identical opaque types are cloned, numeric and text kinds
/// are converted; anything else leaves `dst` as it was
///
/// An absent `dst` indirection is allocated when `src` is present.
pub fn assign(dst: &mut dyn Reflect, src: &dyn Reflect) -> bool {
    let Some(src) = deref_value(src) else {
        return false;
    };
    match dst.value_mut() {
        ValueMut::Indirect(slot) => assign(slot.get_or_insert_default(), src),
        ValueMut::Scalar(slot) => match src.value() {
            ValueRef::Scalar(value) => slot.set(value),
            _ => false,
        },
        ValueMut::Opaque(slot) => match src.value() {
            ValueRef::Opaque(value) => slot.assign_from(value),
            _ => false,
        },
        _ => false,
    }
}

/// Copy a mapping key into the destination key type
fn convert_key<K: Reflect + Default + Clone>(key: &dyn Reflect) -> Option<K> {
    if let Some(key) = key.as_any().downcast_ref::<K>() {
        return Some(key.clone());
    }
    let mut converted = K::default();
    assign(&mut converted, key).then_some(converted)
}

macro_rules! numeric_scalar {
    ($kind:ident as $wide:ty: $($ty:ty),* $(,)?) => {$(
        impl Typed for $ty {
            fn shape() -> Shape {
                Shape::Scalar(ScalarKind::$kind)
            }
        }

        impl Reflect for $ty {
            fn as_any(&self) -> &dyn Any {
                self
            }

            #[allow(clippy::cast_lossless, clippy::unnecessary_cast)]
            fn value(&self) -> ValueRef<'_> {
                ValueRef::Scalar(Scalar::$kind(*self as $wide))
            }

            fn value_mut(&mut self) -> ValueMut<'_> {
                ValueMut::Scalar(self)
            }
        }

        impl ScalarSlot for $ty {
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_possible_wrap,
                clippy::cast_sign_loss,
                clippy::cast_precision_loss,
                clippy::cast_lossless,
                clippy::unnecessary_cast
            )]
            fn set(&mut self, value: Scalar<'_>) -> bool {
                *self = match value {
                    Scalar::Signed(v) => v as $ty,
                    Scalar::Unsigned(v) => v as $ty,
                    Scalar::Float(v) => v as $ty,
                    Scalar::Bool(_) | Scalar::Text(_) => return false,
                };
                true
            }
        }
    )*};
}

numeric_scalar!(Signed as i64: i8, i16, i32, i64, isize);
numeric_scalar!(Unsigned as u64: u8, u16, u32, u64, usize);
numeric_scalar!(Float as f64: f32, f64);

impl Typed for bool {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::Bool)
    }
}

impl Reflect for bool {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value(&self) -> ValueRef<'_> {
        ValueRef::Scalar(Scalar::Bool(*self))
    }

    fn value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Scalar(self)
    }
}

impl ScalarSlot for bool {
    fn set(&mut self, value: Scalar<'_>) -> bool {
        match value {
            Scalar::Bool(v) => {
                *self = v;
                true
            }
            _ => false,
        }
    }
}

impl Typed for String {
    fn shape() -> Shape {
        Shape::Scalar(ScalarKind::Text)
    }
}

impl Reflect for String {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value(&self) -> ValueRef<'_> {
        ValueRef::Scalar(Scalar::Text(self))
    }

    fn value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Scalar(self)
    }
}

impl ScalarSlot for String {
    fn set(&mut self, value: Scalar<'_>) -> bool {
        match value {
            Scalar::Text(text) => {
                text.clone_into(self);
                true
            }
            _ => false,
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        Some(self)
    }
}

macro_rules! opaque_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl Typed for $ty {
            fn shape() -> Shape {
                Shape::Opaque(OpaqueType::of::<$ty>())
            }
        }

        impl Reflect for $ty {
            fn as_any(&self) -> &dyn Any {
                self
            }

            fn value(&self) -> ValueRef<'_> {
                ValueRef::Opaque(self)
            }

            fn value_mut(&mut self) -> ValueMut<'_> {
                ValueMut::Opaque(self)
            }
        }

        impl OpaqueSlot for $ty {
            fn assign_from(&mut self, source: &dyn Any) -> bool {
                match source.downcast_ref::<$ty>() {
                    Some(value) => {
                        *self = *value;
                        true
                    }
                    None => false,
                }
            }
        }
    )*};
}

opaque_scalar!(
    chrono::DateTime<chrono::Utc>,
    chrono::NaiveDate,
    chrono::NaiveDateTime,
    uuid::Uuid,
);

impl<T: Typed> Typed for Option<T> {
    fn shape() -> Shape {
        Shape::Indirect(Box::new(T::shape()))
    }
}

impl<T: Reflect + Default> Reflect for Option<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value(&self) -> ValueRef<'_> {
        match self {
            Some(inner) => ValueRef::Indirect(inner),
            None => ValueRef::Absent,
        }
    }

    fn value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Indirect(self)
    }
}

impl<T: Reflect + Default> IndirectValue for Option<T> {
    fn get_mut(&mut self) -> Option<&mut dyn Reflect> {
        self.as_mut().map(|inner| inner as &mut dyn Reflect)
    }

    fn get_or_insert_default(&mut self) -> &mut dyn Reflect {
        self.get_or_insert_with(T::default)
    }
}

impl<T: Typed> Typed for Box<T> {
    fn shape() -> Shape {
        Shape::Indirect(Box::new(T::shape()))
    }
}

impl<T: Reflect + Default> Reflect for Box<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value(&self) -> ValueRef<'_> {
        ValueRef::Indirect(&**self)
    }

    fn value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Indirect(self)
    }
}

impl<T: Reflect + Default> IndirectValue for Box<T> {
    fn get_mut(&mut self) -> Option<&mut dyn Reflect> {
        Some(&mut **self)
    }

    fn get_or_insert_default(&mut self) -> &mut dyn Reflect {
        &mut **self
    }
}

impl<T: Typed> Typed for Vec<T> {
    fn shape() -> Shape {
        Shape::Sequence(Box::new(T::shape()))
    }
}

impl<T: Reflect + Default> Reflect for Vec<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value(&self) -> ValueRef<'_> {
        ValueRef::Sequence(self)
    }

    fn value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Sequence(self)
    }
}

impl<T: Reflect + Default> SequenceValue for Vec<T> {
    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn get(&self, index: usize) -> Option<&dyn Reflect> {
        <[T]>::get(self, index).map(|item| item as &dyn Reflect)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        <[T]>::get_mut(self, index).map(|item| item as &mut dyn Reflect)
    }

    fn reset(&mut self, len: usize) {
        self.clear();
        self.resize_with(len, T::default);
    }
}

impl<K: Typed, V: Typed> Typed for HashMap<K, V> {
    fn shape() -> Shape {
        Shape::Mapping {
            key: Box::new(K::shape()),
            value: Box::new(V::shape()),
        }
    }
}

impl<K, V> Reflect for HashMap<K, V>
where
    K: Reflect + Default + Clone + Eq + Hash,
    V: Reflect + Default,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value(&self) -> ValueRef<'_> {
        ValueRef::Mapping(self)
    }

    fn value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Mapping(self)
    }
}

impl<K, V> MappingValue for HashMap<K, V>
where
    K: Reflect + Default + Clone + Eq + Hash,
    V: Reflect + Default,
{
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
        Box::new(
            self.iter()
                .map(|(key, value)| (key as &dyn Reflect, value as &dyn Reflect)),
        )
    }

    fn values_mut(&mut self) -> Box<dyn Iterator<Item = &mut dyn Reflect> + '_> {
        Box::new(HashMap::values_mut(self).map(|value| value as &mut dyn Reflect))
    }

    fn clear(&mut self) {
        HashMap::clear(self);
    }

    fn insert_default(&mut self, key: &dyn Reflect) -> Option<&mut dyn Reflect> {
        match self.entry(convert_key::<K>(key)?) {
            HashEntry::Occupied(_) => None,
            HashEntry::Vacant(slot) => Some(slot.insert(V::default()) as &mut dyn Reflect),
        }
    }
}

impl<K: Typed, V: Typed> Typed for BTreeMap<K, V> {
    fn shape() -> Shape {
        Shape::Mapping {
            key: Box::new(K::shape()),
            value: Box::new(V::shape()),
        }
    }
}

impl<K, V> Reflect for BTreeMap<K, V>
where
    K: Reflect + Default + Clone + Ord,
    V: Reflect + Default,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value(&self) -> ValueRef<'_> {
        ValueRef::Mapping(self)
    }

    fn value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Mapping(self)
    }
}

impl<K, V> MappingValue for BTreeMap<K, V>
where
    K: Reflect + Default + Clone + Ord,
    V: Reflect + Default,
{
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
        Box::new(
            self.iter()
                .map(|(key, value)| (key as &dyn Reflect, value as &dyn Reflect)),
        )
    }

    fn values_mut(&mut self) -> Box<dyn Iterator<Item = &mut dyn Reflect> + '_> {
        Box::new(BTreeMap::values_mut(self).map(|value| value as &mut dyn Reflect))
    }

    fn clear(&mut self) {
        BTreeMap::clear(self);
    }

    fn insert_default(&mut self, key: &dyn Reflect) -> Option<&mut dyn Reflect> {
        match self.entry(convert_key::<K>(key)?) {
            BTreeEntry::Occupied(_) => None,
            BTreeEntry::Vacant(slot) => Some(slot.insert(V::default()) as &mut dyn Reflect),
        }
    }
}
