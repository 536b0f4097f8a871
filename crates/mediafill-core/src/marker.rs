//! Media reference markers
//!
//! Zero-behavior newtypes tagging a destination field's role. The descriptor
//! builder recognizes them by their declared [`Shape`], never by name.
//!
//! | Marker      | Source                         | After fill                  |
//! |-------------|--------------------------------|-----------------------------|
//! | [`MediaId`]   | one identifier               | URL                         |
//! | [`MediaIds`]  | list of identifiers          | list of URLs, same order    |
//! | [`RichText`]  | markup with `data-ref="id"`  | markup with `src="url"`     |
//!
//! Unresolved identifiers are left as they were.

use crate::reflect::{Reflect, Scalar, ScalarSlot, ValueMut, ValueRef};
use crate::shape::{MarkerKind, Shape, Typed};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::ops::Deref;

/// Single media reference: identifier before fill, URL after
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(String);

/// List of media references: identifiers before fill, URLs after
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaIds(Vec<String>);

/// Markup text whose marker attributes are rewritten to `src="url"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(String);

macro_rules! text_marker {
    ($name:ident, $kind:ident) => {
        impl $name {
            /// Create from any string
            #[inline]
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow content
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Take content
            #[inline]
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl Typed for $name {
            fn shape() -> Shape {
                Shape::Marker(MarkerKind::$kind)
            }
        }

        impl Reflect for $name {
            fn as_any(&self) -> &dyn Any {
                self
            }

            fn value(&self) -> ValueRef<'_> {
                ValueRef::Scalar(Scalar::Text(&self.0))
            }

            fn value_mut(&mut self) -> ValueMut<'_> {
                ValueMut::Scalar(self)
            }
        }

        impl ScalarSlot for $name {
            fn set(&mut self, value: Scalar<'_>) -> bool {
                self.0.set(value)
            }

            fn text_mut(&mut self) -> Option<&mut String> {
                Some(&mut self.0)
            }
        }
    };
}

text_marker!(MediaId, SingleReference);
text_marker!(RichText, RichMarkup);

impl MediaIds {
    /// Create from identifiers
    #[must_use]
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(ids.into_iter().map(Into::into).collect())
    }

    /// Borrow entries
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Take entries
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl Deref for MediaIds {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for MediaIds {
    fn from(ids: Vec<String>) -> Self {
        Self(ids)
    }
}

impl<S: Into<String>> FromIterator<S> for MediaIds {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl Typed for MediaIds {
    fn shape() -> Shape {
        Shape::Marker(MarkerKind::ReferenceList)
    }
}

impl Reflect for MediaIds {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value(&self) -> ValueRef<'_> {
        ValueRef::Sequence(&self.0)
    }

    fn value_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Sequence(&mut self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{assign, text_of};

    #[test]
    fn markers_have_distinct_shapes() {
        assert_eq!(MediaId::shape(), Shape::Marker(MarkerKind::SingleReference));
        assert_eq!(MediaIds::shape(), Shape::Marker(MarkerKind::ReferenceList));
        assert_eq!(RichText::shape(), Shape::Marker(MarkerKind::RichMarkup));
    }

    #[test]
    fn text_markers_convert_from_plain_text() {
        let mut id = MediaId::default();
        assert!(assign(&mut id, &String::from("cover_1")));
        assert_eq!(id, "cover_1");
        assert_eq!(text_of(&id), Some("cover_1"));
    }

    #[test]
    fn media_ids_preserve_order() {
        let ids: MediaIds = ["a", "b", "a"].into_iter().collect();
        assert_eq!(ids.as_slice(), ["a", "b", "a"]);
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn display_is_raw_content() {
        assert_eq!(RichText::new("<p>x</p>").to_string(), "<p>x</p>");
        assert_eq!(&*MediaId::from("abc"), "abc");
    }
}
