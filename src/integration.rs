//! Store-facing cache wrapper
//!
//! `StoreCache` is the surface the data-access services consume: typed
//! list/detail caching keyed by the `{namespace}:{tenant}:...` convention,
//! and the tenant+namespace wipe they call after every mutation. One
//! instance wraps one shared [`RequestCache`]; it is constructed at
//! application bootstrap and handed to each data store rather than living
//! in module-level state.
//!
//! Serialization failures on either side degrade to "not cached" — the
//! caller falls through to the authoritative source, same as any miss.

use crate::config::{CacheConfig, TtlTier};
use crate::keys::{InvalidationScope, ScopedKey, StoreNamespace};
use crate::store::RequestCache;
use crate::types::StatsReport;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// High-level caching operations for the CRM data stores
pub struct StoreCache {
    cache: Arc<RequestCache>,
}

impl StoreCache {
    /// Create a store cache with its own underlying request cache
    pub fn new(config: CacheConfig) -> Self {
        Self {
            cache: Arc::new(RequestCache::new(config)),
        }
    }

    /// Wrap an existing shared cache instance
    pub fn from_cache(cache: Arc<RequestCache>) -> Self {
        Self { cache }
    }

    /// Get the underlying cache instance
    pub fn inner(&self) -> Arc<RequestCache> {
        Arc::clone(&self.cache)
    }

    /// Cache the rows of a list query
    pub async fn cache_list<T: Serialize>(
        &self,
        namespace: StoreNamespace,
        tenant: &str,
        params: &serde_json::Value,
        rows: &[T],
        tier: TtlTier,
    ) -> bool {
        let key = ScopedKey::list(namespace, tenant, params);
        match serde_json::to_value(rows) {
            Ok(value) => {
                self.cache
                    .set(key.into_key(), value, Some(tier.duration()))
                    .await
            }
            Err(e) => {
                debug!("Skipping list cache for {}: {}", key, e);
                false
            }
        }
    }

    /// Get the cached rows of a list query
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        namespace: StoreNamespace,
        tenant: &str,
        params: &serde_json::Value,
    ) -> Option<Vec<T>> {
        let key = ScopedKey::list(namespace, tenant, params).into_key();
        let value = self.cache.get(&key).await?;
        match serde_json::from_value(value) {
            Ok(rows) => Some(rows),
            Err(e) => {
                // A shape mismatch reads as a miss; drop the bad entry
                debug!("Discarding undecodable list cache for {}: {}", key, e);
                self.cache.delete(&key).await;
                None
            }
        }
    }

    /// Cache a single entity's detail record
    pub async fn cache_detail<T: Serialize>(
        &self,
        namespace: StoreNamespace,
        tenant: &str,
        id: impl fmt::Display,
        record: &T,
        tier: TtlTier,
    ) -> bool {
        let key = ScopedKey::detail(namespace, tenant, id);
        match serde_json::to_value(record) {
            Ok(value) => {
                self.cache
                    .set(key.into_key(), value, Some(tier.duration()))
                    .await
            }
            Err(e) => {
                debug!("Skipping detail cache for {}: {}", key, e);
                false
            }
        }
    }

    /// Get a cached detail record
    pub async fn get_detail<T: DeserializeOwned>(
        &self,
        namespace: StoreNamespace,
        tenant: &str,
        id: impl fmt::Display,
    ) -> Option<T> {
        let key = ScopedKey::detail(namespace, tenant, id).into_key();
        let value = self.cache.get(&key).await?;
        match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!("Discarding undecodable detail cache for {}: {}", key, e);
                self.cache.delete(&key).await;
                None
            }
        }
    }

    /// Drop one entity's detail record, after a targeted update
    pub async fn invalidate_detail(
        &self,
        namespace: StoreNamespace,
        tenant: &str,
        id: impl fmt::Display,
    ) -> bool {
        let key = ScopedKey::detail(namespace, tenant, id).into_key();
        self.cache.delete(&key).await
    }

    /// Wipe every cached query for a tenant+namespace
    ///
    /// Called after any mutation in that store; returns the number of keys
    /// removed.
    pub async fn invalidate_store(&self, namespace: StoreNamespace, tenant: &str) -> usize {
        let scope = InvalidationScope::new(namespace, tenant);
        self.cache.invalidate_scope(&scope).await
    }

    /// Get cache statistics
    pub async fn stats(&self) -> StatsReport {
        self.cache.stats().await
    }

    /// Clear the entire cache
    pub async fn clear(&self) {
        self.cache.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Opportunity {
        id: u64,
        amount_cents: i64,
        status: String,
    }

    fn sample_rows() -> Vec<Opportunity> {
        vec![
            Opportunity {
                id: 1,
                amount_cents: 4_900,
                status: "abandoned_cart".to_string(),
            },
            Opportunity {
                id: 2,
                amount_cents: 12_000,
                status: "failed_payment".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn test_list_round_trip() {
        let store_cache = StoreCache::new(CacheConfig::default());
        let params = json!({"status": "open"});

        let rows = sample_rows();
        assert!(
            store_cache
                .cache_list(
                    StoreNamespace::Opportunities,
                    "t1",
                    &params,
                    &rows,
                    TtlTier::Short,
                )
                .await
        );

        let cached: Vec<Opportunity> = store_cache
            .get_list(StoreNamespace::Opportunities, "t1", &params)
            .await
            .unwrap();
        assert_eq!(cached, rows);
    }

    #[tokio::test]
    async fn test_list_params_are_canonical() {
        let store_cache = StoreCache::new(CacheConfig::default());

        store_cache
            .cache_list(
                StoreNamespace::Agents,
                "t1",
                &json!({"status": "active", "page": 1}),
                &sample_rows(),
                TtlTier::Medium,
            )
            .await;

        // Same filters in a different order hit the same key
        let cached: Option<Vec<Opportunity>> = store_cache
            .get_list(StoreNamespace::Agents, "t1", &json!({"page": 1, "status": "active"}))
            .await;
        assert!(cached.is_some());
    }

    #[tokio::test]
    async fn test_detail_round_trip() {
        let store_cache = StoreCache::new(CacheConfig::default());

        let record = Opportunity {
            id: 7,
            amount_cents: 990,
            status: "recovered".to_string(),
        };

        store_cache
            .cache_detail(StoreNamespace::Opportunities, "t1", 7, &record, TtlTier::Medium)
            .await;

        let cached: Opportunity = store_cache
            .get_detail(StoreNamespace::Opportunities, "t1", 7)
            .await
            .unwrap();
        assert_eq!(cached, record);
    }

    #[tokio::test]
    async fn test_shape_mismatch_reads_as_miss() {
        let store_cache = StoreCache::new(CacheConfig::default());

        store_cache
            .cache_detail(
                StoreNamespace::Opportunities,
                "t1",
                7,
                &json!({"unexpected": true}),
                TtlTier::Medium,
            )
            .await;

        let cached: Option<Opportunity> = store_cache
            .get_detail(StoreNamespace::Opportunities, "t1", 7)
            .await;
        assert!(cached.is_none());

        // The bad entry was dropped, not left to fail every read
        assert_eq!(store_cache.inner().len().await, 0);
    }

    #[tokio::test]
    async fn test_mutation_wipes_tenant_scope_only() {
        let store_cache = StoreCache::new(CacheConfig::default());
        let rows = sample_rows();

        store_cache
            .cache_list(StoreNamespace::Agents, "t1", &json!({}), &rows, TtlTier::Short)
            .await;
        store_cache
            .cache_detail(StoreNamespace::Agents, "t1", 5, &rows[0], TtlTier::Medium)
            .await;
        store_cache
            .cache_list(StoreNamespace::Agents, "t2", &json!({}), &rows, TtlTier::Short)
            .await;
        store_cache
            .cache_list(StoreNamespace::Opportunities, "t1", &json!({}), &rows, TtlTier::Short)
            .await;

        let removed = store_cache
            .invalidate_store(StoreNamespace::Agents, "t1")
            .await;
        assert_eq!(removed, 2);

        // Other tenants and namespaces are untouched
        let other_tenant: Option<Vec<Opportunity>> = store_cache
            .get_list(StoreNamespace::Agents, "t2", &json!({}))
            .await;
        assert!(other_tenant.is_some());
        let other_ns: Option<Vec<Opportunity>> = store_cache
            .get_list(StoreNamespace::Opportunities, "t1", &json!({}))
            .await;
        assert!(other_ns.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_detail() {
        let store_cache = StoreCache::new(CacheConfig::default());

        store_cache
            .cache_detail(StoreNamespace::Guarantees, "t1", "claim-9", &sample_rows()[0], TtlTier::Long)
            .await;

        assert!(
            store_cache
                .invalidate_detail(StoreNamespace::Guarantees, "t1", "claim-9")
                .await
        );
        assert!(
            !store_cache
                .invalidate_detail(StoreNamespace::Guarantees, "t1", "claim-9")
                .await
        );
    }

    #[tokio::test]
    async fn test_tier_ttl_applies() {
        let store_cache = StoreCache::new(CacheConfig::default());

        store_cache
            .cache_detail(StoreNamespace::Dashboard, "t1", "summary", &json!(42), TtlTier::Short)
            .await;

        let report = store_cache
            .inner()
            .metadata("dashboard:t1:detail:summary")
            .await
            .unwrap();
        assert_eq!(report.ttl, Duration::from_secs(180));
    }

    #[tokio::test]
    async fn test_shared_cache_between_stores() {
        let shared = Arc::new(RequestCache::new(CacheConfig::default()));
        let opportunities = StoreCache::from_cache(Arc::clone(&shared));
        let agents = StoreCache::from_cache(Arc::clone(&shared));

        opportunities
            .cache_detail(StoreNamespace::Opportunities, "t1", 1, &json!(1), TtlTier::Medium)
            .await;
        agents
            .cache_detail(StoreNamespace::Agents, "t1", 2, &json!(2), TtlTier::Medium)
            .await;

        assert_eq!(shared.len().await, 2);
        assert_eq!(opportunities.stats().await.size, 2);
    }
}
