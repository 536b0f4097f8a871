//! Declared shapes
//!
//! A [`Shape`] is the static, structural description of a type: what the
//! descriptor builder inspects to decide how a field is transformed.
//! Shapes are produced by [`Typed::shape`], implemented for the std scalars
//! and containers in [`crate::reflect`] and generated for records by
//! [`media_record!`](crate::media_record).

use std::any::TypeId;
use std::fmt;

/// Static shape of a type
///
/// # Example
/// ```rust
/// use mediafill_core::{MarkerKind, MediaId, Shape, Typed};
///
/// assert_eq!(MediaId::shape(), Shape::Marker(MarkerKind::SingleReference));
/// assert!(matches!(<Option<String>>::shape(), Shape::Indirect(_)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Plain scalar copied (or converted) verbatim
    Scalar(ScalarKind),

    /// Scalar-like value copied only between identical types (time, uuid)
    Opaque(OpaqueType),

    /// Media reference marker
    Marker(MarkerKind),

    /// `Option<T>` / `Box<T>`: owned reference to the inner shape
    Indirect(Box<Shape>),

    /// Ordered sequence of elements
    Sequence(Box<Shape>),

    /// Keyed mapping
    Mapping {
        /// Key shape (keys are copied, never transformed)
        key: Box<Shape>,
        /// Value shape
        value: Box<Shape>,
    },

    /// Record with named fields
    Record(RecordType),
}

impl Shape {
    /// Strip every level of indirection
    #[must_use]
    pub fn strip(&self) -> &Shape {
        let mut shape = self;
        while let Shape::Indirect(inner) = shape {
            shape = inner;
        }
        shape
    }

    /// Whether values of this shape are owned references (need allocation)
    #[inline]
    #[must_use]
    pub fn is_indirect(&self) -> bool {
        matches!(self, Shape::Indirect(_))
    }

    /// Record type after stripping indirection
    #[must_use]
    pub fn as_record(&self) -> Option<&RecordType> {
        match self.strip() {
            Shape::Record(record) => Some(record),
            _ => None,
        }
    }
}

/// Scalar classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// `bool`
    Bool,
    /// Signed integers
    Signed,
    /// Unsigned integers
    Unsigned,
    /// `f32` / `f64`
    Float,
    /// `String`
    Text,
}

/// Media reference marker kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// One identifier, replaced by its URL
    SingleReference,
    /// List of identifiers, each replaced by its URL
    ReferenceList,
    /// Markup text with embedded identifier attributes
    RichMarkup,
}

/// Opaque scalar type identity
#[derive(Clone, Copy)]
pub struct OpaqueType {
    id: TypeId,
    name: &'static str,
}

impl OpaqueType {
    /// Opaque type descriptor for `T`
    #[inline]
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Type name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for OpaqueType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for OpaqueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Declared field of a record
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// Field name as declared
    pub name: &'static str,
    /// Declared shape
    pub shape: Shape,
}

impl FieldDecl {
    /// Create field declaration
    #[inline]
    #[must_use]
    pub fn new(name: &'static str, shape: Shape) -> Self {
        Self { name, shape }
    }
}

/// Record type identity plus its lazily evaluated field list
///
/// Fields are produced on demand so that a record may (indirectly) contain
/// itself without the shape becoming infinite.
#[derive(Clone, Copy)]
pub struct RecordType {
    id: TypeId,
    name: &'static str,
    fields: fn() -> Vec<FieldDecl>,
}

impl RecordType {
    /// Record type for `T` with the given field list
    #[inline]
    #[must_use]
    pub fn of<T: 'static>(name: &'static str, fields: fn() -> Vec<FieldDecl>) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name,
            fields,
        }
    }

    /// Type identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Type name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared fields, in declaration order
    #[must_use]
    pub fn fields(&self) -> Vec<FieldDecl> {
        (self.fields)()
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record({})", self.name)
    }
}

/// Types with a statically known shape
pub trait Typed: 'static {
    /// Declared shape of `Self`
    fn shape() -> Shape;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy;

    fn dummy_fields() -> Vec<FieldDecl> {
        vec![FieldDecl::new("id", Shape::Scalar(ScalarKind::Unsigned))]
    }

    #[test]
    fn strip_removes_nested_indirection() {
        let shape = Shape::Indirect(Box::new(Shape::Indirect(Box::new(Shape::Scalar(
            ScalarKind::Text,
        )))));
        assert_eq!(shape.strip(), &Shape::Scalar(ScalarKind::Text));
        assert!(shape.is_indirect());
    }

    #[test]
    fn record_type_equality_is_identity() {
        let a = RecordType::of::<Dummy>("Dummy", dummy_fields);
        let b = RecordType::of::<Dummy>("Renamed", Vec::new);
        let c = RecordType::of::<u8>("Dummy", dummy_fields);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn record_fields_are_lazy() {
        let record = RecordType::of::<Dummy>("Dummy", dummy_fields);
        let fields = record.fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "id");
    }

    #[test]
    fn as_record_looks_through_indirection() {
        let record = RecordType::of::<Dummy>("Dummy", dummy_fields);
        let shape = Shape::Indirect(Box::new(Shape::Record(record)));
        assert_eq!(shape.as_record().map(RecordType::name), Some("Dummy"));
        assert!(Shape::Scalar(ScalarKind::Bool).as_record().is_none());
    }
}
