use async_trait::async_trait;
use mediafill_core::prelude::*;
use mediafill_core::DescriptorCache;
use mediafill_test_utils::{sample_product, sample_resolver, ProductDto, SlowResolver};
use mockall::mock;
use mockall::predicate::always;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

mock! {
    pub BatchResolver {}

    #[async_trait]
    impl Resolver for BatchResolver {
        async fn resolve(
            &self,
            ctx: &FillContext,
            ids: &BTreeSet<String>,
        ) -> Result<ResolutionMap, ResolveError>;
    }
}

fn filler<R: Resolver + 'static>(resolver: R) -> Filler {
    Filler::new(resolver).with_cache(Arc::new(DescriptorCache::new()))
}

#[tokio::test]
async fn test_resolver_receives_full_set_once() {
    let mut resolver = MockBatchResolver::new();
    resolver
        .expect_resolve()
        .withf(|_, ids| ids.len() == 6 && ids.contains("video_id") && !ids.contains(""))
        .times(1)
        .returning(|_, _| Ok(ResolutionMap::new()));

    let mut result: Vec<ProductDto> = Vec::new();
    auto_fill(
        &FillContext::background(),
        &filler(resolver),
        &[sample_product(), sample_product()],
        &mut result,
    )
    .await
    .unwrap();

    assert_eq!(result.len(), 2);
}

#[tokio::test]
async fn test_resolver_error_propagates_verbatim() {
    let mut resolver = MockBatchResolver::new();
    resolver
        .expect_resolve()
        .with(always(), always())
        .times(1)
        .returning(|_, _| Err(ResolveError::rejected("batch too large")));

    let mut result: Vec<ProductDto> = Vec::new();
    let err = auto_fill(
        &FillContext::background(),
        &filler(resolver),
        &[sample_product()],
        &mut result,
    )
    .await
    .unwrap_err();

    assert!(matches!(err.as_resolve_error(), Some(ResolveError::Rejected(_))));
    assert!(!err.is_retryable());
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_resolver_sees_caller_context() {
    let ctx = FillContext::background().with_timeout(Duration::from_secs(30));
    let mut resolver = MockBatchResolver::new();
    resolver
        .expect_resolve()
        .withf(|ctx, _| ctx.deadline().is_some() && !ctx.is_cancelled())
        .times(1)
        .returning(|_, _| Ok(ResolutionMap::new()));

    let mut result: Vec<ProductDto> = Vec::new();
    auto_fill(&ctx, &filler(resolver), &[sample_product()], &mut result)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_already_cancelled_context_never_calls_resolver() {
    let mut resolver = MockBatchResolver::new();
    resolver.expect_resolve().times(0);

    let ctx = FillContext::background();
    ctx.cancel();
    let mut result: Vec<ProductDto> = Vec::new();
    let err = auto_fill(&ctx, &filler(resolver), &[sample_product()], &mut result)
        .await
        .unwrap_err();

    assert!(matches!(err, FillError::Cancelled));
    assert!(result.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_expired_deadline_never_calls_resolver() {
    let mut resolver = MockBatchResolver::new();
    resolver.expect_resolve().times(0);

    let ctx = FillContext::background().with_timeout(Duration::from_millis(10));
    tokio::time::advance(Duration::from_millis(20)).await;

    let mut result: Vec<ProductDto> = Vec::new();
    let err = auto_fill(&ctx, &filler(resolver), &[sample_product()], &mut result)
        .await
        .unwrap_err();

    assert!(matches!(err, FillError::DeadlineExceeded));
}

#[tokio::test(start_paused = true)]
async fn test_slow_resolver_hits_context_deadline() {
    let resolver = SlowResolver::new(Duration::from_secs(10), sample_resolver());
    let ctx = FillContext::background().with_timeout(Duration::from_secs(1));
    let mut result: Vec<ProductDto> = Vec::new();

    let err = auto_fill(&ctx, &filler(resolver), &[sample_product()], &mut result)
        .await
        .unwrap_err();

    assert!(matches!(err, FillError::DeadlineExceeded));
    assert!(err.is_retryable());
    assert!(result.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_resolver_hits_configured_timeout() {
    let resolver = SlowResolver::new(Duration::from_secs(10), sample_resolver());
    let config = FillerConfig::default().with_resolve_timeout(Duration::from_secs(2));
    let filler = Filler::with_config(resolver, config)
        .unwrap()
        .with_cache(Arc::new(DescriptorCache::new()));
    let mut result: Vec<ProductDto> = Vec::new();

    let err = auto_fill(&FillContext::background(), &filler, &[sample_product()], &mut result)
        .await
        .unwrap_err();

    assert!(matches!(err, FillError::DeadlineExceeded));
}

#[tokio::test(start_paused = true)]
async fn test_sub_second_timeout_allows_fast_resolver() {
    let resolver = SlowResolver::new(Duration::from_millis(100), sample_resolver());
    let config = FillerConfig::default().with_resolve_timeout(Duration::from_millis(500));
    let filler = Filler::with_config(resolver, config)
        .unwrap()
        .with_cache(Arc::new(DescriptorCache::new()));
    let mut result: Vec<ProductDto> = Vec::new();

    auto_fill(&FillContext::background(), &filler, &[sample_product()], &mut result)
        .await
        .unwrap();

    let zh = result[0].languages["zh"].as_deref().unwrap();
    assert_eq!(zh.cover, "https://cdn.example.com/cover.jpg");
}

#[tokio::test(start_paused = true)]
async fn test_sub_second_timeout_still_bounds_slow_resolver() {
    let resolver = SlowResolver::new(Duration::from_secs(1), sample_resolver());
    let config = FillerConfig::default().with_resolve_timeout(Duration::from_millis(500));
    let filler = Filler::with_config(resolver, config)
        .unwrap()
        .with_cache(Arc::new(DescriptorCache::new()));
    let mut result: Vec<ProductDto> = Vec::new();

    let err = auto_fill(&FillContext::background(), &filler, &[sample_product()], &mut result)
        .await
        .unwrap_err();

    assert!(matches!(err, FillError::DeadlineExceeded));
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_during_resolution() {
    let resolver = SlowResolver::new(Duration::from_secs(10), sample_resolver());
    let ctx = FillContext::background();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let mut result: Vec<ProductDto> = Vec::new();
    let err = auto_fill(&ctx, &filler(resolver), &[sample_product()], &mut result)
        .await
        .unwrap_err();

    assert!(matches!(err, FillError::Cancelled));
    assert!(result.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_resolver_within_deadline_succeeds() {
    let resolver = SlowResolver::new(Duration::from_millis(100), sample_resolver());
    let ctx = FillContext::background().with_timeout(Duration::from_secs(5));
    let mut result: Vec<ProductDto> = Vec::new();

    auto_fill(&ctx, &filler(resolver), &[sample_product()], &mut result)
        .await
        .unwrap();

    let zh = result[0].languages["zh"].as_deref().unwrap();
    assert_eq!(zh.cover, "https://cdn.example.com/cover.jpg");
}
