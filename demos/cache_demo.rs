//! Request Cache Demo Application
//!
//! Walks through the cache lifecycle a data store sees: cold read, fill,
//! warm read, mutation wipe, and diagnostics.
//!
//! Usage:
//!   cargo run --example cache_demo
//!
//! Environment variables:
//!   RECOVERY_CACHE_MAX_ENTRIES            - entry capacity (default: 1000)
//!   RECOVERY_CACHE_DEFAULT_TTL_SECS       - default TTL (default: 300)
//!   RECOVERY_CACHE_CLEANUP_INTERVAL_SECS  - sweep interval (default: 60)
//!   RECOVERY_CACHE_DEBUG                  - verbose per-operation logging

use recovery_cache::{CacheConfig, RequestCache, StoreCache, StoreNamespace, TtlTier};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, Level};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    // Pick up overrides from a local .env if present
    dotenv::dotenv().ok();

    info!("=== Recovery Cache Demo ===");

    let config = CacheConfig::from_env();
    info!("Cache configuration: {:?}", config);

    // One shared cache, injected into each store wrapper at bootstrap
    let shared = Arc::new(RequestCache::new(config));
    RequestCache::start_auto_cleanup(&shared).await;

    let opportunities = StoreCache::from_cache(Arc::clone(&shared));
    let tenant = Uuid::new_v4().to_string();
    let params = json!({"status": "open", "limit": 50});

    info!("\n--- Cold read (miss) ---");
    let cold: Option<Vec<serde_json::Value>> = opportunities
        .get_list(StoreNamespace::Opportunities, &tenant, &params)
        .await;
    info!("Cache returned: {:?}", cold);

    info!("\n--- Fill after the backend fetch ---");
    let rows = vec![
        json!({"id": 1, "status": "open", "source": "abandoned_cart", "amount_cents": 4900}),
        json!({"id": 2, "status": "open", "source": "failed_payment", "amount_cents": 12000}),
    ];
    opportunities
        .cache_list(StoreNamespace::Opportunities, &tenant, &params, &rows, TtlTier::Short)
        .await;
    info!("Cached {} rows for tenant {}", rows.len(), tenant);

    info!("\n--- Warm read (hit) ---");
    let warm: Option<Vec<serde_json::Value>> = opportunities
        .get_list(StoreNamespace::Opportunities, &tenant, &params)
        .await;
    info!("Cache returned {} rows", warm.map(|r| r.len()).unwrap_or(0));

    info!("\n--- Entry diagnostics ---");
    for key in shared.keys().await {
        if let Some(report) = shared.metadata(&key).await {
            info!(
                "{}: accessed {} times, {:?} remaining",
                report.key, report.access_count, report.remaining_ttl
            );
        }
    }

    info!("\n--- Mutation wipes the tenant scope ---");
    let removed = opportunities
        .invalidate_store(StoreNamespace::Opportunities, &tenant)
        .await;
    info!("Invalidated {} cached queries", removed);

    let after: Option<Vec<serde_json::Value>> = opportunities
        .get_list(StoreNamespace::Opportunities, &tenant, &params)
        .await;
    info!("Read after mutation: {:?}", after);

    info!("\n--- Statistics ---");
    let stats = opportunities.stats().await;
    info!(
        "hits: {}, misses: {}, hit rate: {:.1}%, size: {}/{} ({:.1}%), ~{:.2} KB",
        stats.hits,
        stats.misses,
        stats.hit_rate,
        stats.size,
        stats.max_size,
        stats.utilization,
        stats.estimated_size_kb
    );

    shared.stop_auto_cleanup().await;
    Ok(())
}
