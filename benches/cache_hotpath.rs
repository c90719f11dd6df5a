use criterion::{criterion_group, criterion_main, Criterion};
use recovery_cache::{CacheConfig, RequestCache};
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

fn seeded_cache(entries: usize) -> Arc<RequestCache> {
    let config = CacheConfig::builder()
        .max_entries(entries * 2)
        .default_ttl(Duration::from_secs(300))
        .build();
    let cache = Arc::new(RequestCache::new(config));

    tokio_test::block_on(async {
        for i in 0..entries {
            cache
                .set(
                    format!("agents:t{}:detail:{}", i % 20, i),
                    json!({"id": i, "status": "active"}),
                    None,
                )
                .await;
        }
    });

    cache
}

fn bench_cache_hotpath(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("build runtime");
    let cache = seeded_cache(1_000);

    c.bench_function("cache/get_hit", |b| {
        b.to_async(&rt).iter(|| {
            let cache = Arc::clone(&cache);
            async move { black_box(cache.get("agents:t10:detail:510").await) }
        });
    });

    c.bench_function("cache/get_miss", |b| {
        b.to_async(&rt).iter(|| {
            let cache = Arc::clone(&cache);
            async move { black_box(cache.get("guarantees:t99:detail:0").await) }
        });
    });

    c.bench_function("cache/set_replace", |b| {
        b.to_async(&rt).iter(|| {
            let cache = Arc::clone(&cache);
            async move {
                black_box(
                    cache
                        .set(
                            "agents:t10:detail:510".to_string(),
                            json!({"id": 510, "status": "paused"}),
                            None,
                        )
                        .await,
                )
            }
        });
    });

    c.bench_function("cache/invalidate_scope_scan", |b| {
        b.to_async(&rt).iter(|| {
            let cache = Arc::clone(&cache);
            // Scans every key without matching; measures the scan itself
            async move { black_box(cache.invalidate_pattern("guarantees:t99").await) }
        });
    });
}

criterion_group!(benches, bench_cache_hotpath);
criterion_main!(benches);
