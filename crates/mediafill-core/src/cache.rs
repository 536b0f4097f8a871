//! Process-wide descriptor cache using dashmap
//!
//! Descriptors are keyed by [`ShapePair`] and built at most once per pair.
//! Reads take a shard read lock only; builds happen outside any lock and are
//! published with a single entry insert, so concurrent builders of the same
//! pair agree on one descriptor (first publish wins).

use crate::descriptor::{DescriptorBuilder, RecordLink, ShapePair, TypeDescriptor};
use crate::shape::{Shape, Typed};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static GLOBAL: Lazy<Arc<DescriptorCache>> = Lazy::new(|| Arc::new(DescriptorCache::new()));

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of published descriptors
    pub entry_count: usize,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Descriptors built and published
    pub builds: u64,
}

/// Concurrent map from shape pair to immutable descriptor
///
/// Entries are never evicted or invalidated: the key space is bounded by the
/// record types compiled into the program.
#[derive(Debug)]
pub struct DescriptorCache {
    entries: DashMap<ShapePair, Arc<TypeDescriptor>>,
    empty: Arc<TypeDescriptor>,
    hits: AtomicU64,
    builds: AtomicU64,
}

impl Default for DescriptorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorCache {
    /// Create empty cache
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            empty: Arc::new(TypeDescriptor::empty()),
            hits: AtomicU64::new(0),
            builds: AtomicU64::new(0),
        }
    }

    /// Shared process-wide cache
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Get or build the descriptor for `S -> D`
    #[must_use]
    pub fn descriptor<S: Typed, D: Typed>(&self) -> Arc<TypeDescriptor> {
        self.descriptor_for(&S::shape(), &D::shape())
    }

    /// Get or build the descriptor for two declared shapes
    ///
    /// Pairs where either side is not a record get the shared empty descriptor.
    #[must_use]
    pub fn descriptor_for(&self, source: &Shape, destination: &Shape) -> Arc<TypeDescriptor> {
        DescriptorBuilder::new(self).descriptor(source, destination)
    }

    /// Descriptor a nested plan links to
    ///
    /// Normally already published by the build that produced the link;
    /// built here otherwise.
    #[must_use]
    pub fn linked(&self, link: &RecordLink) -> Arc<TypeDescriptor> {
        DescriptorBuilder::new(self).record_descriptor(link.source(), link.destination())
    }

    /// Whether a descriptor for `pair` has been published
    #[inline]
    #[must_use]
    pub fn contains(&self, pair: &ShapePair) -> bool {
        self.entries.contains_key(pair)
    }

    /// Number of published descriptors
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been published yet
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn lookup(&self, pair: &ShapePair) -> Option<Arc<TypeDescriptor>> {
        let found = self.entries.get(pair).map(|entry| Arc::clone(entry.value()));
        if let Some(descriptor) = &found {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(
                source = descriptor.source_name(),
                destination = descriptor.destination_name(),
                "descriptor cache hit"
            );
        }
        found
    }

    pub(crate) fn publish(&self, pair: ShapePair, descriptor: TypeDescriptor) -> Arc<TypeDescriptor> {
        match self.entries.entry(pair) {
            // Lost the race: discard ours, adopt the published one
            Entry::Occupied(published) => Arc::clone(published.get()),
            Entry::Vacant(slot) => {
                self.builds.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(
                    source = descriptor.source_name(),
                    destination = descriptor.destination_name(),
                    fields = descriptor.fields().len(),
                    "published type descriptor"
                );
                let descriptor = Arc::new(descriptor);
                slot.insert(Arc::clone(&descriptor));
                descriptor
            }
        }
    }

    pub(crate) fn empty(&self) -> Arc<TypeDescriptor> {
        Arc::clone(&self.empty)
    }
}
