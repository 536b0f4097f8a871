//! Benchmarks for collection fills and descriptor lookups

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mediafill_core::prelude::*;
use mediafill_core::DescriptorCache;
use mediafill_test_utils::{sample_product, sample_resolver, Product, ProductDto};
use std::sync::Arc;

fn products(count: usize) -> Vec<Product> {
    (0..count)
        .map(|i| {
            let mut product = sample_product();
            product.id = u32::try_from(i).unwrap_or(u32::MAX);
            product
        })
        .collect()
}

fn bench_collection_fill(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let filler = Filler::new(sample_resolver());
    let ctx = FillContext::background();

    let mut group = c.benchmark_group("auto_fill");
    for size in [1usize, 100, 1_000] {
        let src = products(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &src, |b, src| {
            let (ctx, filler) = (&ctx, &filler);
            b.to_async(&runtime).iter(|| async move {
                let mut dst: Vec<ProductDto> = Vec::new();
                auto_fill(ctx, filler, black_box(src), &mut dst)
                    .await
                    .unwrap();
                dst
            });
        });
    }
    group.finish();
}

fn bench_descriptor_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("descriptor");

    let warm = DescriptorCache::new();
    let _ = warm.descriptor::<Product, ProductDto>();
    group.bench_function("cached", |b| {
        b.iter(|| black_box(warm.descriptor::<Product, ProductDto>()));
    });

    group.bench_function("cold_build", |b| {
        b.iter(|| {
            let cache = Arc::new(DescriptorCache::new());
            black_box(cache.descriptor::<Product, ProductDto>())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_collection_fill, bench_descriptor_lookup);
criterion_main!(benches);
