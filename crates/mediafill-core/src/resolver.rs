//! Resolver contract
//!
//! The engine never talks to storage itself: it hands every distinct
//! identifier collected from one invocation to a [`Resolver`] in a single
//! batch and substitutes what comes back.

use crate::context::FillContext;
use crate::error::ResolveError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Resolution outcome for one identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionRecord {
    /// Resolved URL; meaningful only when `success` is set
    pub url: String,
    /// Whether the identifier resolved
    pub success: bool,
}

impl ResolutionRecord {
    /// Successful resolution to `url`
    #[inline]
    #[must_use]
    pub fn resolved(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            success: true,
        }
    }

    /// Failed resolution; the reference is left untouched
    #[inline]
    #[must_use]
    pub fn failed() -> Self {
        Self::default()
    }

    /// URL if the resolution succeeded
    #[inline]
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.success.then_some(self.url.as_str())
    }
}

/// Identifier -> resolution outcome
///
/// Identifiers missing from the map are treated exactly like failed ones.
pub type ResolutionMap = HashMap<String, ResolutionRecord>;

/// Batch identifier resolution
///
/// Called at most once per fill invocation and only with a non-empty,
/// deduplicated set of identifiers. Implementations may return a subset.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve a batch of identifiers
    ///
    /// # Errors
    /// Any error aborts the fill; the caller's destination is left untouched.
    async fn resolve(
        &self,
        ctx: &FillContext,
        ids: &BTreeSet<String>,
    ) -> Result<ResolutionMap, ResolveError>;
}

#[async_trait]
impl<R: Resolver + ?Sized> Resolver for Arc<R> {
    async fn resolve(
        &self,
        ctx: &FillContext,
        ids: &BTreeSet<String>,
    ) -> Result<ResolutionMap, ResolveError> {
        (**self).resolve(ctx, ids).await
    }
}

/// In-memory resolver over a fixed identifier table
///
/// # Example
/// ```rust
/// use mediafill_core::StaticResolver;
///
/// let resolver = StaticResolver::new()
///     .with_url("cover", "https://cdn.example.com/cover.jpg")
///     .with_failure("broken");
/// assert_eq!(resolver.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    table: ResolutionMap,
}

impl StaticResolver {
    /// Create empty resolver; every identifier is unresolved
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `id` to `url`
    #[must_use]
    pub fn with_url(mut self, id: impl Into<String>, url: impl Into<String>) -> Self {
        self.table.insert(id.into(), ResolutionRecord::resolved(url));
        self
    }

    /// Report `id` as a failed resolution
    #[must_use]
    pub fn with_failure(mut self, id: impl Into<String>) -> Self {
        self.table.insert(id.into(), ResolutionRecord::failed());
        self
    }

    /// Number of known identifiers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no identifier is known
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticResolver {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(entries: I) -> Self {
        entries
            .into_iter()
            .fold(Self::new(), |resolver, (id, url)| resolver.with_url(id, url))
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolve(
        &self,
        _ctx: &FillContext,
        ids: &BTreeSet<String>,
    ) -> Result<ResolutionMap, ResolveError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.table.get(id).map(|record| (id.clone(), record.clone())))
            .collect())
    }
}
