use mediafill_core::{DescriptorCache, Kind, ShapePair, Typed, ValuePlan};
use mediafill_test_utils::{Product, ProductDto, ProductLangDto, ProductLanguage};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn pair<S: Typed, D: Typed>() -> ShapePair {
    match (S::shape().as_record(), D::shape().as_record()) {
        (Some(source), Some(destination)) => ShapePair::new(source, destination),
        _ => panic!("record shapes expected"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_build_publishes_once() {
    let cache = Arc::new(DescriptorCache::new());
    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.descriptor::<Product, ProductDto>() })
        })
        .collect();

    let mut built = Vec::with_capacity(tasks.len());
    for task in tasks {
        built.push(task.await.unwrap());
    }

    let published = cache.descriptor::<Product, ProductDto>();
    assert!(built.iter().all(|d| Arc::ptr_eq(d, &published)));

    let stats = cache.stats();
    assert_eq!(stats.entry_count, 2);
    assert_eq!(stats.builds, 2);
    assert!(cache.contains(&pair::<Product, ProductDto>()));
    assert!(cache.contains(&pair::<ProductLanguage, ProductLangDto>()));
}

#[test]
fn test_independent_caches_build_identical_plans() {
    let first = DescriptorCache::new().descriptor::<Product, ProductDto>();
    let second = DescriptorCache::new().descriptor::<Product, ProductDto>();
    assert_eq!(*first, *second);
}

#[test]
fn test_product_plan_layout() {
    let cache = DescriptorCache::new();
    let descriptor = cache.descriptor::<Product, ProductDto>();

    let kinds: Vec<(&str, Kind)> = descriptor
        .fields()
        .iter()
        .map(|field| (field.name, field.kind()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("id", Kind::Scalar),
            ("points", Kind::Scalar),
            ("status", Kind::Scalar),
            ("languages", Kind::KeyedMapping),
        ]
    );

    let languages = descriptor.field("languages").unwrap();
    let ValuePlan::KeyedMapping { value, .. } = &languages.plan else {
        panic!("mapping plan expected");
    };
    let nested = cache.linked(value.nested_record().unwrap());
    assert_eq!(nested.source_name(), "ProductLanguage");
    assert_eq!(nested.destination_name(), "ProductLangDto");
    assert_eq!(
        nested.fields().iter().map(|f| f.kind()).collect::<Vec<_>>(),
        vec![Kind::Scalar, Kind::SingleReference, Kind::ReferenceList, Kind::RichMarkup]
    );
}

#[test]
fn test_global_cache_serves_repeated_lookups() {
    let global = DescriptorCache::global();
    let first = global.descriptor::<ProductLanguage, ProductLangDto>();
    let before = global.stats().hits;
    let second = global.descriptor::<ProductLanguage, ProductLangDto>();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(global.stats().hits > before);
}
