//! Testing utilities for the mediafill workspace
//!
//! Shared fixtures, resolvers, and tracing setup.

#![allow(missing_docs)]

use async_trait::async_trait;
use mediafill_core::{
    media_record, FillContext, MediaId, MediaIds, ResolutionMap, ResolveError, Resolver,
    RichText, StaticResolver,
};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

media_record! {
    /// Localized product content as stored
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct ProductLanguage {
        pub name: String,
        pub cover: String,
        pub gallery: Vec<String>,
        pub description: String,
    }
}

media_record! {
    /// Product as stored
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Product {
        pub id: u32,
        pub points: f64,
        pub status: i32,
        pub languages: HashMap<String, Option<Box<ProductLanguage>>>,
    }
}

media_record! {
    /// Localized product content as served
    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    pub struct ProductLangDto {
        pub name: String,
        pub cover: MediaId,
        pub gallery: MediaIds,
        pub description: RichText,
    }
}

media_record! {
    /// Product as served
    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    pub struct ProductDto {
        pub id: u32,
        pub points: f64,
        pub status: i32,
        pub languages: HashMap<String, Option<Box<ProductLangDto>>>,
    }
}

pub const CDN: &str = "https://cdn.example.com";

pub fn cdn_url(path: &str) -> String {
    format!("{CDN}/{path}")
}

pub fn language(name: &str, cover: &str, gallery: &[&str], description: &str) -> ProductLanguage {
    ProductLanguage {
        name: name.to_owned(),
        cover: cover.to_owned(),
        gallery: gallery.iter().map(|id| (*id).to_owned()).collect(),
        description: description.to_owned(),
    }
}

pub fn product(id: u32, languages: Vec<(&str, ProductLanguage)>) -> Product {
    Product {
        id,
        points: 99.9,
        status: 1,
        languages: languages
            .into_iter()
            .map(|(code, lang)| (code.to_owned(), Some(Box::new(lang))))
            .collect(),
    }
}

/// Two-language product referencing every fixture identifier
pub fn sample_product() -> Product {
    product(
        1,
        vec![
            (
                "zh",
                language(
                    "商品A",
                    "cover_id",
                    &["gallery_1", "gallery_2"],
                    r#"<p>介绍</p><img data-ref="rich_img"><video data-ref="video_id"></video>"#,
                ),
            ),
            (
                "en",
                language("Product A", "cover_en", &["gallery_1"], "<p>Description</p>"),
            ),
        ],
    )
}

/// Resolver knowing every identifier used by [`sample_product`]
pub fn sample_resolver() -> StaticResolver {
    StaticResolver::new()
        .with_url("cover_id", cdn_url("cover.jpg"))
        .with_url("cover_en", cdn_url("cover_en.jpg"))
        .with_url("gallery_1", cdn_url("g1.jpg"))
        .with_url("gallery_2", cdn_url("g2.jpg"))
        .with_url("rich_img", cdn_url("rich.jpg"))
        .with_url("video_id", cdn_url("video.mp4"))
}

/// Resolver that records every batch it receives
#[derive(Debug, Default)]
pub struct RecordingResolver {
    inner: StaticResolver,
    calls: AtomicUsize,
    batches: Mutex<Vec<BTreeSet<String>>>,
}

impl RecordingResolver {
    pub fn new(inner: StaticResolver) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<BTreeSet<String>> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Resolver for RecordingResolver {
    async fn resolve(
        &self,
        ctx: &FillContext,
        ids: &BTreeSet<String>,
    ) -> Result<ResolutionMap, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ids.clone());
        self.inner.resolve(ctx, ids).await
    }
}

/// Resolver that always fails with a transport error
#[derive(Debug, Clone)]
pub struct FailingResolver {
    message: String,
}

impl FailingResolver {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Resolver for FailingResolver {
    async fn resolve(
        &self,
        _ctx: &FillContext,
        _ids: &BTreeSet<String>,
    ) -> Result<ResolutionMap, ResolveError> {
        Err(ResolveError::transport(self.message.clone()))
    }
}

/// Resolver that answers after a fixed delay
#[derive(Debug, Clone)]
pub struct SlowResolver {
    delay: Duration,
    inner: StaticResolver,
}

impl SlowResolver {
    pub fn new(delay: Duration, inner: StaticResolver) -> Self {
        Self { delay, inner }
    }
}

#[async_trait]
impl Resolver for SlowResolver {
    async fn resolve(
        &self,
        ctx: &FillContext,
        ids: &BTreeSet<String>,
    ) -> Result<ResolutionMap, ResolveError> {
        tokio::time::sleep(self.delay).await;
        self.inner.resolve(ctx, ids).await
    }
}

/// Install a test-friendly subscriber honouring `RUST_LOG`; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
