//! Fill engine entry points
//!
//! One invocation runs three sequential steps:
//!
//! 1. collect: build every destination element from its source, gathering
//!    media identifiers
//! 2. resolve: one batched [`Resolver`] call with every distinct identifier
//! 3. fill: substitute resolved URLs in place
//!
//! The destination is assigned only after all three succeed.

use crate::cache::DescriptorCache;
use crate::config::FillerConfig;
use crate::context::FillContext;
use crate::descriptor::{RecordLink, ValuePlan};
use crate::error::{FillError, FillResult};
use crate::markup::MarkupScanner;
use crate::reflect::Reflect;
use crate::resolver::{ResolutionMap, Resolver};
use crate::shape::Typed;
use crate::walk::{allocate, CollectPass, FillPass};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

/// Resolver plus everything an invocation shares across calls
///
/// Cheap to clone; clones share the resolver and the descriptor cache.
#[derive(Clone)]
pub struct Filler {
    resolver: Arc<dyn Resolver>,
    cache: Arc<DescriptorCache>,
    scanner: MarkupScanner,
    config: FillerConfig,
}

impl fmt::Debug for Filler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filler")
            .field("cache", &self.cache.stats())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Filler {
    /// Filler with default configuration and the process-wide descriptor cache
    #[must_use]
    pub fn new<R: Resolver + 'static>(resolver: R) -> Self {
        Self::from_shared(Arc::new(resolver))
    }

    /// Filler over an already shared resolver
    #[must_use]
    pub fn from_shared(resolver: Arc<dyn Resolver>) -> Self {
        Self {
            resolver,
            cache: DescriptorCache::global(),
            scanner: MarkupScanner::default(),
            config: FillerConfig::default(),
        }
    }

    /// Filler with explicit configuration
    ///
    /// # Errors
    /// Returns [`FillError::Config`] if `config` does not validate.
    pub fn with_config<R: Resolver + 'static>(resolver: R, config: FillerConfig) -> FillResult<Self> {
        Self::from_shared_with_config(Arc::new(resolver), config)
    }

    /// Filler over an already shared resolver, with explicit configuration
    ///
    /// # Errors
    /// Returns [`FillError::Config`] if `config` does not validate.
    pub fn from_shared_with_config(
        resolver: Arc<dyn Resolver>,
        config: FillerConfig,
    ) -> FillResult<Self> {
        config.validate()?;
        let scanner = MarkupScanner::new(&config.marker_attribute)?;
        Ok(Self {
            resolver,
            cache: DescriptorCache::global(),
            scanner,
            config,
        })
    }

    /// Use `cache` instead of the process-wide one
    #[inline]
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<DescriptorCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &FillerConfig {
        &self.config
    }

    /// Descriptor cache in use
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &Arc<DescriptorCache> {
        &self.cache
    }

    /// Map `src` into a fresh destination collection and resolve its media
    /// references; see [`auto_fill`]
    ///
    /// # Errors
    /// Returns the resolver's error, [`FillError::Cancelled`] or
    /// [`FillError::DeadlineExceeded`]; `dst` is untouched in every case.
    pub async fn fill<S, D>(&self, ctx: &FillContext, src: &[S], dst: &mut Vec<D>) -> FillResult<()>
    where
        S: Typed + Reflect,
        D: Typed + Reflect + Default,
    {
        if src.is_empty() {
            return Ok(());
        }
        let span = tracing::debug_span!(
            "auto_fill",
            invocation = %Uuid::new_v4(),
            elements = src.len()
        );
        let filled = self.run::<S, D>(ctx, src).instrument(span).await?;
        *dst = filled;
        Ok(())
    }

    /// Single-value form of [`Filler::fill`]; see [`auto_fill_one`]
    ///
    /// # Errors
    /// Same as [`Filler::fill`]; `dst` is untouched on error.
    pub async fn fill_one<S, D>(
        &self,
        ctx: &FillContext,
        src: Option<&S>,
        dst: Option<&mut D>,
    ) -> FillResult<()>
    where
        S: Typed + Reflect,
        D: Typed + Reflect + Default,
    {
        let (Some(src), Some(dst)) = (src, dst) else {
            return Ok(());
        };
        let mut filled: Vec<D> = Vec::with_capacity(1);
        self.fill(ctx, std::slice::from_ref(src), &mut filled).await?;
        if let Some(value) = filled.pop() {
            *dst = value;
        }
        Ok(())
    }

    async fn run<S, D>(&self, ctx: &FillContext, src: &[S]) -> FillResult<Vec<D>>
    where
        S: Typed + Reflect,
        D: Typed + Reflect + Default,
    {
        let mut staged: Vec<D> = Vec::with_capacity(src.len());
        staged.resize_with(src.len(), D::default);
        for target in &mut staged {
            allocate(target);
        }

        let Some(link) = RecordLink::of::<S, D>() else {
            debug!("source or destination is not a record, nothing to map");
            return Ok(staged);
        };
        let plan = ValuePlan::NestedRecord(link);

        let mut collect = CollectPass::new(&self.scanner, &self.cache);
        for (source, target) in src.iter().zip(staged.iter_mut()) {
            collect.value(source, target, &plan);
        }
        let ids = collect.into_ids();

        if ids.is_empty() {
            debug!("no media references collected");
            return Ok(staged);
        }

        let resolutions = self.resolve(ctx, ids.ids()).await?;
        let mut fill = FillPass::new(&self.scanner, &self.cache, &resolutions);
        for target in &mut staged {
            fill.value(target, &plan);
        }

        let unresolved = ids
            .ids()
            .iter()
            .filter(|id| resolutions.get(id.as_str()).and_then(|r| r.url()).is_none())
            .count();
        debug!(distinct = ids.len(), unresolved, "media references filled");

        Ok(staged)
    }

    async fn resolve(&self, ctx: &FillContext, ids: &BTreeSet<String>) -> FillResult<ResolutionMap> {
        if ctx.is_cancelled() {
            return Err(FillError::Cancelled);
        }

        let now = Instant::now();
        let deadline = match (ctx.deadline(), self.config.resolve_timeout()) {
            (Some(at), Some(timeout)) => Some(at.min(now + timeout)),
            (Some(at), None) => Some(at),
            (None, Some(timeout)) => Some(now + timeout),
            (None, None) => None,
        };
        if deadline.is_some_and(|at| at <= now) {
            return Err(FillError::DeadlineExceeded);
        }

        debug!(distinct = ids.len(), "resolving media references");

        let call = async {
            match deadline {
                Some(at) => tokio::time::timeout_at(at, self.resolver.resolve(ctx, ids))
                    .await
                    .map_err(|_| FillError::DeadlineExceeded)
                    .and_then(|result| result.map_err(FillError::from)),
                None => self.resolver.resolve(ctx, ids).await.map_err(FillError::from),
            }
        };

        let outcome = tokio::select! {
            biased;
            () = ctx.token().cancelled() => Err(FillError::Cancelled),
            result = call => result,
        };

        if let Err(err) = &outcome {
            warn!(error = %err, distinct = ids.len(), "media reference resolution failed");
        }
        outcome
    }
}

/// Map every source element into a freshly allocated destination collection
/// and replace its media identifiers with resolved URLs
///
/// - An empty `src` is a successful no-op; `dst` is untouched.
/// - The resolver is called at most once, with every distinct non-empty
///   identifier, and not at all when none was collected.
/// - On any error `dst` is untouched; on success it is replaced wholesale.
///
/// # Example
/// ```rust
/// use mediafill_core::prelude::*;
///
/// media_record! {
///     #[derive(Debug, Default)]
///     pub struct Product { pub name: String, pub cover: String }
/// }
///
/// media_record! {
///     #[derive(Debug, Default)]
///     pub struct ProductView { pub name: String, pub cover: MediaId }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), FillError> {
/// let filler = Filler::new(StaticResolver::new().with_url("c1", "https://cdn/c1.jpg"));
/// let src = vec![Product { name: "mug".into(), cover: "c1".into() }];
/// let mut dst: Vec<ProductView> = Vec::new();
///
/// auto_fill(&FillContext::background(), &filler, &src, &mut dst).await?;
/// assert_eq!(dst[0].cover, "https://cdn/c1.jpg");
/// # Ok(())
/// # }
/// ```
///
/// # Errors
/// Returns the resolver's error unchanged, or [`FillError::Cancelled`] /
/// [`FillError::DeadlineExceeded`] when the context ends the resolver call.
pub async fn auto_fill<S, D>(
    ctx: &FillContext,
    filler: &Filler,
    src: &[S],
    dst: &mut Vec<D>,
) -> FillResult<()>
where
    S: Typed + Reflect,
    D: Typed + Reflect + Default,
{
    filler.fill(ctx, src, dst).await
}

/// Fill a single value
///
/// Absent `src` or `dst` is a successful no-op.
///
/// # Errors
/// Same as [`auto_fill`]; `dst` is untouched on error.
pub async fn auto_fill_one<S, D>(
    ctx: &FillContext,
    filler: &Filler,
    src: Option<&S>,
    dst: Option<&mut D>,
) -> FillResult<()>
where
    S: Typed + Reflect,
    D: Typed + Reflect + Default,
{
    filler.fill_one(ctx, src, dst).await
}
