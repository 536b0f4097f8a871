//! Mediafill Core - record-to-transfer mapping with media reference resolution
//!
//! Copies a collection of source records into a collection of transfer
//! records, matching fields by name, and replaces every media identifier it
//! meets with a resolved URL:
//! - Builds and caches one field plan per (source, destination) record pair
//! - Collects identifiers from [`MediaId`], [`MediaIds`] and [`RichText`] fields
//! - Resolves all distinct identifiers with a single [`Resolver`] call
//! - Substitutes URLs in place, leaving unresolved references untouched
//!
//! # Example
//!
//! ```rust
//! use mediafill_core::prelude::*;
//!
//! media_record! {
//!     #[derive(Debug, Default)]
//!     pub struct Article {
//!         pub title: String,
//!         pub cover: String,
//!         pub body: String,
//!     }
//! }
//!
//! media_record! {
//!     #[derive(Debug, Default)]
//!     pub struct ArticleView {
//!         pub title: String,
//!         pub cover: MediaId,
//!         pub body: RichText,
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), FillError> {
//! let resolver = StaticResolver::new()
//!     .with_url("c1", "https://cdn.example.com/c1.jpg")
//!     .with_url("r1", "https://cdn.example.com/r1.png");
//! let filler = Filler::new(resolver);
//!
//! let articles = vec![Article {
//!     title: "Hello".into(),
//!     cover: "c1".into(),
//!     body: r#"<p>x</p><img data-ref="r1">"#.into(),
//! }];
//! let mut views: Vec<ArticleView> = Vec::new();
//! auto_fill(&FillContext::background(), &filler, &articles, &mut views).await?;
//!
//! assert_eq!(views[0].cover, "https://cdn.example.com/c1.jpg");
//! assert_eq!(views[0].body, r#"<p>x</p><img src="https://cdn.example.com/r1.png">"#);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod cache;
pub mod collector;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod filler;
pub mod marker;
pub mod markup;
pub mod record;
pub mod reflect;
pub mod resolver;
pub mod shape;

mod walk;

// Re-exports for convenience
pub use cache::{CacheStats, DescriptorCache};
pub use collector::IdentifierCollector;
pub use config::FillerConfig;
pub use context::FillContext;
pub use descriptor::{FieldPlan, Kind, RecordLink, ShapePair, TypeDescriptor, ValuePlan};
pub use error::{ConfigError, FillError, FillResult, ResolveError};
pub use filler::{auto_fill, auto_fill_one, Filler};
pub use marker::{MediaId, MediaIds, RichText};
pub use markup::{MarkupScanner, DEFAULT_MARKER_ATTRIBUTE};
pub use reflect::{
    IndirectValue, MappingValue, OpaqueSlot, RecordValue, Reflect, Scalar, ScalarSlot,
    SequenceValue, ValueMut, ValueRef,
};
pub use resolver::{ResolutionMap, ResolutionRecord, Resolver, StaticResolver};
pub use shape::{FieldDecl, MarkerKind, OpaqueType, RecordType, ScalarKind, Shape, Typed};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for declaring records and running fills
    pub use crate::{
        auto_fill, auto_fill_one, media_record, FillContext, FillError, Filler, FillerConfig,
        MediaId, MediaIds, Reflect, ResolutionMap, ResolutionRecord, ResolveError, Resolver,
        RichText, StaticResolver, Typed,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    media_record! {
        #[derive(Debug, Default, Clone)]
        struct Post {
            cover: String,
            gallery: Vec<String>,
            text: String,
        }
    }

    media_record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct PostView {
            cover: MediaId,
            gallery: MediaIds,
            text: RichText,
        }
    }

    #[tokio::test]
    async fn end_to_end_fill() {
        let resolver = StaticResolver::new()
            .with_url("c1", "u1")
            .with_url("g1", "ug1")
            .with_failure("g2")
            .with_url("r1", "ur1");
        let filler = Filler::new(resolver).with_cache(Arc::new(DescriptorCache::new()));

        let src = vec![Post {
            cover: "c1".into(),
            gallery: vec!["g1".into(), "g2".into()],
            text: r#"<p>x</p><img data-ref="r1">"#.into(),
        }];
        let mut dst: Vec<PostView> = Vec::new();
        auto_fill(&FillContext::background(), &filler, &src, &mut dst)
            .await
            .unwrap();

        assert_eq!(
            dst,
            vec![PostView {
                cover: MediaId::from("u1"),
                gallery: MediaIds::new(["ug1", "g2"]),
                text: RichText::from(r#"<p>x</p><img src="ur1">"#),
            }]
        );
        assert_eq!(filler.cache().stats().entry_count, 1);
    }

    #[tokio::test]
    async fn empty_source_leaves_destination() {
        let filler = Filler::new(StaticResolver::new());
        let mut dst = vec![PostView::default()];
        auto_fill::<Post, PostView>(&FillContext::background(), &filler, &[], &mut dst)
            .await
            .unwrap();
        assert_eq!(dst.len(), 1);
    }

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
