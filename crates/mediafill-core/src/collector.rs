//! Identifier collection

use std::collections::BTreeSet;

/// Deduplicating set of media identifiers gathered during the collect pass
///
/// Empty identifiers are never recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierCollector {
    ids: BTreeSet<String>,
}

impl IdentifierCollector {
    /// Create empty collector
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one identifier
    pub fn add(&mut self, id: &str) {
        if !id.is_empty() && !self.ids.contains(id) {
            self.ids.insert(id.to_owned());
        }
    }

    /// Record every identifier yielded by `ids`
    pub fn extend<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            self.add(id);
        }
    }

    /// Number of distinct identifiers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing was recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether `id` was recorded
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Recorded identifiers, sorted
    #[inline]
    #[must_use]
    pub fn ids(&self) -> &BTreeSet<String> {
        &self.ids
    }

    /// Take recorded identifiers
    #[inline]
    #[must_use]
    pub fn into_ids(self) -> BTreeSet<String> {
        self.ids
    }
}
