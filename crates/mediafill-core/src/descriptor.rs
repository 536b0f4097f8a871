//! Type descriptor builder
//!
//! Inspects a (source, destination) record pair once and emits the ordered
//! field plan the tree walker follows. Nested records are planned through the
//! [`DescriptorCache`] so each pair is built at most once.
//!
//! A nested record plan is a [`RecordLink`] naming its pair rather than an
//! embedded descriptor. A record that (indirectly) contains itself therefore
//! links back to the single published descriptor of its pair, and every
//! published plan is the same whichever pair was requested first.
//!
//! # Classification
//!
//! A destination field is classified by its declared shape (indirection
//! stripped), first match wins:
//!
//! 1. [`MediaId`](crate::MediaId) -> `SingleReference`
//! 2. [`MediaIds`](crate::MediaIds) -> `ReferenceList`
//! 3. [`RichText`](crate::RichText) -> `RichMarkup`
//! 4. sequence -> `Sequence` (element classified recursively)
//! 5. mapping -> `KeyedMapping` (value classified recursively, key copied)
//! 6. record -> `NestedRecord`
//! 7. anything else -> `Scalar`
//!
//! A composite destination whose source is not the same composite degrades
//! to `Scalar`; the scalar copy then fails and the field keeps its default.

use crate::cache::DescriptorCache;
use crate::shape::{MarkerKind, RecordType, Shape, Typed};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Cache key: identity of a (source record, destination record) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapePair {
    /// Source record type
    pub source: TypeId,
    /// Destination record type
    pub destination: TypeId,
}

impl ShapePair {
    /// Pair for two record types
    #[inline]
    #[must_use]
    pub fn new(source: &RecordType, destination: &RecordType) -> Self {
        Self {
            source: source.id(),
            destination: destination.id(),
        }
    }
}

/// Reference from a plan to the descriptor of a nested record pair
///
/// Resolved through the [`DescriptorCache`] when walked.
#[derive(Clone, Copy, PartialEq)]
pub struct RecordLink {
    source: RecordType,
    destination: RecordType,
}

impl RecordLink {
    /// Link for two record types
    #[inline]
    #[must_use]
    pub fn new(source: RecordType, destination: RecordType) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Link for two declared shapes; `None` unless both are records
    #[must_use]
    pub fn between(source: &Shape, destination: &Shape) -> Option<Self> {
        Some(Self::new(*source.as_record()?, *destination.as_record()?))
    }

    /// Link for `S -> D`; `None` unless both are records
    #[must_use]
    pub fn of<S: Typed, D: Typed>() -> Option<Self> {
        Self::between(&S::shape(), &D::shape())
    }

    /// Cache key of the linked pair
    #[inline]
    #[must_use]
    pub fn pair(&self) -> ShapePair {
        ShapePair::new(&self.source, &self.destination)
    }

    /// Source record type
    #[inline]
    #[must_use]
    pub fn source(&self) -> &RecordType {
        &self.source
    }

    /// Destination record type
    #[inline]
    #[must_use]
    pub fn destination(&self) -> &RecordType {
        &self.destination
    }
}

impl fmt::Debug for RecordLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source.name(), self.destination.name())
    }
}

/// Transformation role of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Copied or converted verbatim
    Scalar,
    /// One media identifier
    SingleReference,
    /// List of media identifiers
    ReferenceList,
    /// Markup with embedded identifiers
    RichMarkup,
    /// Sequence walked element by element
    Sequence,
    /// Mapping walked value by value
    KeyedMapping,
    /// Nested record walked field by field
    NestedRecord,
}

/// Recursive plan for one value
#[derive(Debug, Clone, PartialEq)]
pub enum ValuePlan {
    /// Scalar copy
    Scalar,
    /// Identifier copy, then URL substitution
    SingleReference,
    /// Identifier list copy, then per-element URL substitution
    ReferenceList,
    /// Markup copy, then attribute rewrite
    RichMarkup,
    /// Element plan
    Sequence(Box<ValuePlan>),
    /// Mapping with a copied key and a planned value
    KeyedMapping {
        /// Declared key shape, copied verbatim
        key: Shape,
        /// Value plan
        value: Box<ValuePlan>,
    },
    /// Nested record, walked with the linked pair's descriptor
    NestedRecord(RecordLink),
}

impl ValuePlan {
    /// Kind at this level
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Scalar => Kind::Scalar,
            Self::SingleReference => Kind::SingleReference,
            Self::ReferenceList => Kind::ReferenceList,
            Self::RichMarkup => Kind::RichMarkup,
            Self::Sequence(_) => Kind::Sequence,
            Self::KeyedMapping { .. } => Kind::KeyedMapping,
            Self::NestedRecord(_) => Kind::NestedRecord,
        }
    }

    /// Nested record link, if this plan (or its element/value plan) walks a record
    #[must_use]
    pub fn nested_record(&self) -> Option<&RecordLink> {
        match self {
            Self::NestedRecord(link) => Some(link),
            Self::Sequence(element) => element.nested_record(),
            Self::KeyedMapping { value, .. } => value.nested_record(),
            _ => None,
        }
    }
}

/// One matched field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPlan {
    /// Field index in the source record
    pub source_index: usize,
    /// Field index in the destination record
    pub destination_index: usize,
    /// Declared name shared by both fields
    pub name: &'static str,
    /// How the value is transformed
    pub plan: ValuePlan,
}

impl FieldPlan {
    /// Transformation kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.plan.kind()
    }
}

/// Ordered field plan for one record pair
///
/// Immutable once published; shared read-only through `Arc`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeDescriptor {
    source: &'static str,
    destination: &'static str,
    fields: Vec<FieldPlan>,
}

impl TypeDescriptor {
    /// Descriptor with no fields (non-record pairs)
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Matched fields, in destination declaration order
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[FieldPlan] {
        &self.fields
    }

    /// Plan for a field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldPlan> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Whether the walk is a no-op
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Source record name
    #[inline]
    #[must_use]
    pub fn source_name(&self) -> &'static str {
        self.source
    }

    /// Destination record name
    #[inline]
    #[must_use]
    pub fn destination_name(&self) -> &'static str {
        self.destination
    }
}

/// Single get-or-build pass over a shape pair and everything nested in it
pub(crate) struct DescriptorBuilder<'c> {
    cache: &'c DescriptorCache,
    in_progress: Vec<ShapePair>,
}

impl<'c> DescriptorBuilder<'c> {
    pub(crate) fn new(cache: &'c DescriptorCache) -> Self {
        Self {
            cache,
            in_progress: Vec::new(),
        }
    }

    /// Descriptor for two declared shapes; empty unless both are records
    pub(crate) fn descriptor(&mut self, source: &Shape, destination: &Shape) -> Arc<TypeDescriptor> {
        match (source.as_record(), destination.as_record()) {
            (Some(source), Some(destination)) => self.record_descriptor(source, destination),
            _ => self.cache.empty(),
        }
    }

    pub(crate) fn record_descriptor(
        &mut self,
        source: &RecordType,
        destination: &RecordType,
    ) -> Arc<TypeDescriptor> {
        let pair = ShapePair::new(source, destination);
        if let Some(published) = self.cache.lookup(&pair) {
            return published;
        }

        self.in_progress.push(pair);
        let descriptor = self.build(source, destination);
        self.in_progress.pop();

        self.cache.publish(pair, descriptor)
    }

    /// Link to a nested pair, building and publishing it unless it is
    /// already being built further up this pass
    fn link(&mut self, source: &RecordType, destination: &RecordType) -> RecordLink {
        let link = RecordLink::new(*source, *destination);
        if self.in_progress.contains(&link.pair()) {
            tracing::trace!(
                source = source.name(),
                destination = destination.name(),
                "recursive record pair linked back"
            );
        } else {
            self.record_descriptor(source, destination);
        }
        link
    }

    fn build(&mut self, source: &RecordType, destination: &RecordType) -> TypeDescriptor {
        let source_fields = source.fields();
        let by_name: HashMap<&str, (usize, &Shape)> = source_fields
            .iter()
            .enumerate()
            .map(|(index, field)| (field.name, (index, &field.shape)))
            .collect();

        let destination_fields = destination.fields();
        let mut fields = Vec::with_capacity(destination_fields.len());
        for (destination_index, field) in destination_fields.iter().enumerate() {
            let Some(&(source_index, source_shape)) = by_name.get(field.name) else {
                continue;
            };
            fields.push(FieldPlan {
                source_index,
                destination_index,
                name: field.name,
                plan: self.classify(source_shape, &field.shape),
            });
        }

        tracing::trace!(
            source = source.name(),
            destination = destination.name(),
            matched = fields.len(),
            "built type descriptor"
        );

        TypeDescriptor {
            source: source.name(),
            destination: destination.name(),
            fields,
        }
    }

    fn classify(&mut self, source: &Shape, destination: &Shape) -> ValuePlan {
        let source = source.strip();
        match destination.strip() {
            Shape::Marker(MarkerKind::SingleReference) => ValuePlan::SingleReference,
            Shape::Marker(MarkerKind::ReferenceList) => ValuePlan::ReferenceList,
            Shape::Marker(MarkerKind::RichMarkup) => ValuePlan::RichMarkup,
            Shape::Sequence(element) => match source {
                Shape::Sequence(source_element) => {
                    ValuePlan::Sequence(Box::new(self.classify(source_element, element)))
                }
                _ => ValuePlan::Scalar,
            },
            Shape::Mapping { key, value } => match source {
                Shape::Mapping {
                    value: source_value,
                    ..
                } => ValuePlan::KeyedMapping {
                    key: (**key).clone(),
                    value: Box::new(self.classify(source_value, value)),
                },
                _ => ValuePlan::Scalar,
            },
            Shape::Record(record) => match source {
                Shape::Record(source_record) => {
                    ValuePlan::NestedRecord(self.link(source_record, record))
                }
                _ => ValuePlan::Scalar,
            },
            Shape::Scalar(_) | Shape::Opaque(_) | Shape::Indirect(_) => ValuePlan::Scalar,
        }
    }
}
