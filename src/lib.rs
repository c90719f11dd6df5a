//! # Recovery Cache (recovery-cache)
//!
//! A bounded in-process request cache for multi-tenant CRM data stores,
//! with TTL expiry, LRU eviction, and tenant-scoped bulk invalidation.
//!
//! ## Features
//!
//! - **TTL-Based Expiration**: lazy on read, eager on a periodic sweep task
//! - **LRU Eviction**: least recently accessed entries leave first at capacity
//! - **Segment-Anchored Invalidation**: wipe a tenant+namespace scope after a
//!   mutation without clipping neighboring namespaces
//! - **Typed Key Conventions**: `{namespace}:{tenant}:list:{params}` and
//!   `{namespace}:{tenant}:detail:{id}` keys built by construction, with
//!   canonicalized query parameters
//! - **Best-Effort Contract**: no public operation errors or panics; failures
//!   collapse to a miss so callers fall through to the authoritative source
//! - **Instrumentation**: hit/miss/eviction counters, per-entry diagnostics,
//!   namespace grouping, and full state export/import
//!
//! ## Architecture
//!
//! [`RequestCache`] is the shared core: one map, one LRU queue, one set of
//! counters behind a single async lock. [`StoreCache`] is the surface the
//! data-access services consume, adding typed list/detail operations and the
//! post-mutation tenant wipe. One `RequestCache` is constructed at
//! application bootstrap and shared by every store.
//!
//! ## Example
//!
//! ```rust
//! use recovery_cache::{CacheConfig, StoreCache, StoreNamespace, TtlTier};
//! use serde_json::json;
//!
//! # async fn example() {
//! let store_cache = StoreCache::new(CacheConfig::default());
//!
//! // Cache a list query for one tenant
//! let params = json!({"status": "open"});
//! let rows = vec![json!({"id": 1, "status": "abandoned_cart"})];
//! store_cache
//!     .cache_list(StoreNamespace::Opportunities, "t1", &params, &rows, TtlTier::Short)
//!     .await;
//!
//! // Later reads hit the cache until the TTL elapses
//! if let Some(cached) = store_cache
//!     .get_list::<serde_json::Value>(StoreNamespace::Opportunities, "t1", &params)
//!     .await
//! {
//!     println!("cache hit: {} rows", cached.len());
//! }
//!
//! // After a mutation, wipe everything cached for that tenant+namespace
//! store_cache
//!     .invalidate_store(StoreNamespace::Opportunities, "t1")
//!     .await;
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod error;
pub mod integration;
pub mod invalidation;
pub mod keys;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use config::{CacheConfig, CacheConfigBuilder, CacheConfigPatch, TtlTier};
pub use entry::{CacheEntry, CacheMetadata};
pub use error::{CacheError, Result};
pub use integration::StoreCache;
pub use invalidation::{pattern_matches, InvalidationEvent, InvalidationReason};
pub use keys::{
    canonical_params, split_namespace, InvalidationScope, ScopedKey, StoreNamespace,
};
pub use store::{CacheSnapshot, RequestCache};
pub use types::{CacheKey, CacheStats, CacheValue, MetadataReport, StatsReport};
