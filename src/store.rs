//! Request cache with TTL expiry, segment-anchored invalidation, and LRU eviction
//!
//! The cache is best-effort by contract: no public operation returns an
//! error or panics. Every failure state collapses to `None`/`false`/`0` so
//! callers always fall through to the authoritative data source.

use crate::config::{CacheConfig, CacheConfigPatch};
use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::invalidation::{pattern_matches, InvalidationEvent, InvalidationReason};
use crate::keys::{split_namespace, InvalidationScope};
use crate::types::{CacheKey, CacheStats, CacheValue, MetadataReport, StatsReport};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Bounded in-process request cache shared by the data stores
///
/// This implementation provides:
/// - Thread-safe async access via RwLock
/// - Automatic TTL-based expiration (lazy on read, eager on periodic sweep)
/// - LRU eviction when the entry limit is reached
/// - Segment-anchored pattern, regex, and namespace invalidation
/// - Counter-based metrics and entry-level diagnostics
pub struct RequestCache {
    /// Internal storage and configuration
    inner: RwLock<CacheState>,

    /// Handle of the periodic sweep task, when running
    cleanup_task: Mutex<Option<JoinHandle<()>>>,

    /// Signals the sweep task that the interval may have changed
    config_changed: Notify,
}

/// Internal cache state, guarded by one lock
struct CacheState {
    /// Cache configuration
    config: CacheConfig,

    /// Main storage: key -> entry
    entries: HashMap<CacheKey, CacheEntry>,

    /// LRU tracking: front is the least recently accessed key
    lru_queue: VecDeque<CacheKey>,

    /// Raw performance counters
    stats: CacheStats,
}

impl RequestCache {
    /// Create a new cache with the given configuration
    ///
    /// An invalid configuration is logged and replaced with the defaults
    /// rather than refused.
    pub fn new(config: CacheConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!("Invalid cache configuration, using defaults: {}", e);
                CacheConfig::default()
            }
        };

        info!("Initializing request cache with config: {:?}", config);

        Self {
            inner: RwLock::new(CacheState {
                config,
                entries: HashMap::new(),
                lru_queue: VecDeque::new(),
                stats: CacheStats::default(),
            }),
            cleanup_task: Mutex::new(None),
            config_changed: Notify::new(),
        }
    }

    /// Store a value under the given key
    ///
    /// Returns `false` for an empty key, or when the cache is full and LRU
    /// eviction is disabled. An existing entry is replaced wholesale, value
    /// and metadata both. `ttl` of `None` uses the configured default.
    pub async fn set(&self, key: CacheKey, value: CacheValue, ttl: Option<Duration>) -> bool {
        if let Err(e) = Self::validate_key(&key) {
            warn!("Rejected cache write: {}", e);
            return false;
        }

        let mut guard = self.inner.write().await;
        let state = &mut *guard;

        let ttl = state
            .config
            .ttl_with_jitter(ttl.unwrap_or(state.config.default_ttl));
        let entry = CacheEntry::new(key.clone(), value, ttl);

        let is_new = !state.entries.contains_key(&key);
        if is_new && state.entries.len() >= state.config.max_entries {
            if state.config.enable_lru_eviction {
                while state.entries.len() >= state.config.max_entries {
                    if !Self::evict_lru(state) {
                        break;
                    }
                }
            } else {
                warn!("Cache full and LRU eviction disabled, rejecting write: {}", key);
                return false;
            }
        }

        if state.config.debug {
            if is_new {
                debug!("Inserting cache entry: {}", key);
            } else {
                debug!("Replacing cache entry: {}", key);
            }
        }

        state.lru_queue.retain(|k| k != &key);
        state.lru_queue.push_back(key.clone());
        state.entries.insert(key, entry);
        state.stats.sets += 1;

        true
    }

    /// Get a value from the cache
    ///
    /// Returns `None` on miss. An expired entry is deleted on access and
    /// treated as a miss. A hit updates the entry's access metadata and its
    /// LRU position.
    pub async fn get(&self, key: &str) -> Option<CacheValue> {
        let mut guard = self.inner.write().await;
        let state = &mut *guard;

        let expired = match state.entries.get(key) {
            None => {
                state.stats.misses += 1;
                if state.config.debug {
                    debug!("Cache miss: {}", key);
                }
                return None;
            }
            Some(entry) => entry.is_expired(),
        };

        if expired {
            state.stats.misses += 1;
            state.stats.evictions_ttl += 1;
            Self::remove_entry(state, key);
            if state.config.debug {
                debug!("Cache entry expired: {}", key);
            }
            return None;
        }

        let value = state.entries.get_mut(key).map(|entry| {
            entry.mark_accessed();
            entry.value.clone()
        })?;

        state.stats.hits += 1;
        if state.config.enable_lru_eviction {
            state.lru_queue.retain(|k| k != key);
            state.lru_queue.push_back(key.to_string());
        }
        if state.config.debug {
            debug!("Cache hit: {}", key);
        }

        Some(value)
    }

    /// Remove a specific entry; returns whether anything was removed
    pub async fn delete(&self, key: &str) -> bool {
        let mut guard = self.inner.write().await;
        let state = &mut *guard;

        let removed = Self::remove_entry(state, key);
        if removed && state.config.debug {
            debug!("Removed cache entry: {} ({})", key, InvalidationReason::Manual);
        }
        removed
    }

    /// Remove every key matching the segment-anchored pattern
    ///
    /// A key matches when it equals the pattern or starts with
    /// `pattern + ":"`; `"agents:u1"` wipes every cached query for that
    /// tenant and namespace without touching `"agent:u1"`. Returns the
    /// number of keys removed.
    pub async fn invalidate_pattern(&self, pattern: &str) -> usize {
        if pattern.is_empty() {
            return 0;
        }
        let reason = InvalidationReason::PatternMatch {
            pattern: pattern.to_string(),
        };
        self.remove_matching(|k| pattern_matches(k, pattern), reason)
            .await
    }

    /// Remove every key matching the regular expression
    pub async fn invalidate_regex(&self, regex: &Regex) -> usize {
        let reason = InvalidationReason::RegexMatch {
            pattern: regex.as_str().to_string(),
        };
        self.remove_matching(|k| regex.is_match(k), reason).await
    }

    /// Remove every key under the given namespace
    pub async fn invalidate_namespace(&self, namespace: &str) -> usize {
        if namespace.is_empty() {
            return 0;
        }
        let reason = InvalidationReason::NamespaceMatch {
            namespace: namespace.to_string(),
        };
        self.remove_matching(|k| pattern_matches(k, namespace), reason)
            .await
    }

    /// Remove every key in a tenant+namespace scope
    ///
    /// This is the post-mutation wipe used by the data stores.
    pub async fn invalidate_scope(&self, scope: &InvalidationScope) -> usize {
        let pattern = scope.to_string();
        let reason = InvalidationReason::PatternMatch {
            pattern: pattern.clone(),
        };
        self.remove_matching(move |k| pattern_matches(k, &pattern), reason)
            .await
    }

    /// Clear all entries from the cache
    pub async fn clear(&self) {
        let mut guard = self.inner.write().await;
        let state = &mut *guard;

        let count = state.entries.len();
        state.entries.clear();
        state.lru_queue.clear();

        info!(
            "Cleared {} entries from cache ({})",
            count,
            InvalidationReason::Cleared
        );
    }

    /// Remove all expired entries; returns the number removed
    ///
    /// Runs eagerly on the periodic sweep and may be called manually.
    pub async fn cleanup(&self) -> usize {
        let mut guard = self.inner.write().await;
        let state = &mut *guard;

        let expired_keys: Vec<CacheKey> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            Self::remove_entry(state, key);
        }

        if !expired_keys.is_empty() {
            state.stats.evictions_ttl += expired_keys.len() as u64;

            let event = InvalidationEvent::new(InvalidationReason::Expired, expired_keys.clone())
                .with_context(format!("expiry sweep removed {} entries", expired_keys.len()));
            debug!("{}", event);
        }

        expired_keys.len()
    }

    /// Get a point-in-time statistics snapshot
    pub async fn stats(&self) -> StatsReport {
        let state = self.inner.read().await;
        let estimated_bytes: usize = state.entries.values().map(|e| e.metadata.size_bytes).sum();
        StatsReport::from_counters(
            &state.stats,
            state.entries.len(),
            state.config.max_entries,
            estimated_bytes,
        )
    }

    /// All keys currently in the cache
    pub async fn keys(&self) -> Vec<CacheKey> {
        let state = self.inner.read().await;
        state.entries.keys().cloned().collect()
    }

    /// Diagnostic metadata for a single entry, without touching access state
    pub async fn metadata(&self, key: &str) -> Option<MetadataReport> {
        let state = self.inner.read().await;
        state.entries.get(key).map(|entry| entry.report())
    }

    /// Group all current keys by their first colon-delimited segment
    pub async fn by_namespace(&self) -> HashMap<String, Vec<CacheKey>> {
        let state = self.inner.read().await;
        let mut groups: HashMap<String, Vec<CacheKey>> = HashMap::new();
        for key in state.entries.keys() {
            groups
                .entry(split_namespace(key).to_string())
                .or_default()
                .push(key.clone());
        }
        for keys in groups.values_mut() {
            keys.sort();
        }
        groups
    }

    /// Number of entries in the cache
    pub async fn len(&self) -> usize {
        let state = self.inner.read().await;
        state.entries.len()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        let state = self.inner.read().await;
        state.entries.is_empty()
    }

    /// Current configuration
    pub async fn config(&self) -> CacheConfig {
        let state = self.inner.read().await;
        state.config.clone()
    }

    /// Export the full cache state for debugging or transfer
    pub async fn export(&self) -> CacheSnapshot {
        let state = self.inner.read().await;
        let mut entries: Vec<CacheEntry> = state.entries.values().cloned().collect();
        entries.sort_by_key(|e| e.metadata.last_accessed);

        CacheSnapshot {
            exported_at: Utc::now(),
            config: state.config.clone(),
            stats: state.stats.clone(),
            entries,
        }
    }

    /// Replace the cache contents with a previously exported snapshot
    ///
    /// Clears first, then rehydrates entries, stats, and configuration.
    /// Returns `false` (leaving the cache untouched) when the snapshot's
    /// configuration is invalid.
    pub async fn import(&self, snapshot: CacheSnapshot) -> bool {
        if let Err(e) = snapshot.config.validate() {
            warn!("Rejected snapshot import: {}", e);
            return false;
        }

        let mut guard = self.inner.write().await;
        let state = &mut *guard;

        state.entries.clear();
        state.lru_queue.clear();

        let mut entries = snapshot.entries;
        entries.sort_by_key(|e| e.metadata.last_accessed);
        for entry in entries {
            if entry.key.is_empty() || state.entries.contains_key(&entry.key) {
                continue;
            }
            state.lru_queue.push_back(entry.key.clone());
            state.entries.insert(entry.key.clone(), entry);
        }

        state.stats = snapshot.stats;
        state.config = snapshot.config;

        while state.entries.len() > state.config.max_entries {
            if !Self::evict_lru(state) {
                break;
            }
        }

        info!("Imported {} entries from snapshot", state.entries.len());
        drop(guard);

        // The imported config may carry a different sweep interval
        self.config_changed.notify_one();
        true
    }

    /// Shallow-merge a configuration patch
    ///
    /// An invalid resulting configuration is rejected and the previous one
    /// kept. Shrinking `max_entries` evicts down to the new capacity; a
    /// `cleanup_interval` change restarts the periodic sweep timer.
    pub async fn configure(&self, patch: CacheConfigPatch) {
        let interval_changed;
        {
            let mut guard = self.inner.write().await;
            let state = &mut *guard;

            let previous = state.config.clone();
            state.config.apply(patch);
            if let Err(e) = state.config.validate() {
                warn!("Rejected configuration patch: {}", e);
                state.config = previous;
                return;
            }

            if state.config.enable_lru_eviction {
                while state.entries.len() > state.config.max_entries {
                    if !Self::evict_lru(state) {
                        break;
                    }
                }
            }

            interval_changed = state.config.cleanup_interval != previous.cleanup_interval;
        }

        if interval_changed {
            info!("Cleanup interval changed, rescheduling sweep");
            // A stored permit also covers the window before the sweep task
            // first polls, so a reschedule is never lost
            self.config_changed.notify_one();
        }
    }

    /// Spawn the periodic expiry sweep for this cache handle
    ///
    /// Idempotent: a second call while the task is running does nothing.
    /// Respects `enable_auto_cleanup`.
    pub async fn start_auto_cleanup(cache: &Arc<RequestCache>) {
        if !cache.inner.read().await.config.enable_auto_cleanup {
            info!("Automatic cache cleanup disabled by configuration");
            return;
        }

        let mut slot = cache.cleanup_task.lock().await;
        if slot.is_some() {
            return;
        }

        let worker = Arc::clone(cache);
        *slot = Some(tokio::spawn(async move {
            info!("Starting automatic cache cleanup task");
            loop {
                let interval = worker.inner.read().await.config.cleanup_interval;
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        let removed = worker.cleanup().await;
                        if removed > 0 {
                            debug!("Auto cleanup removed {} expired entries", removed);
                        }
                    }
                    _ = worker.config_changed.notified() => {
                        // interval changed; loop back and restart the timer
                    }
                }
            }
        }));
    }

    /// Abort the periodic sweep task, if running
    pub async fn stop_auto_cleanup(&self) {
        let mut slot = self.cleanup_task.lock().await;
        if let Some(handle) = slot.take() {
            handle.abort();
            info!("Stopped automatic cache cleanup task");
        }
    }

    /// Internal: key validation at the write boundary
    fn validate_key(key: &str) -> crate::error::Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey("empty key".to_string()));
        }
        Ok(())
    }

    /// Internal: remove an entry and its LRU slot
    fn remove_entry(state: &mut CacheState, key: &str) -> bool {
        if state.entries.remove(key).is_some() {
            state.lru_queue.retain(|k| k != key);
            true
        } else {
            false
        }
    }

    /// Internal: evict the least-recently-accessed entry
    ///
    /// Returns whether an entry was removed, so capacity loops terminate
    /// even on an empty queue.
    fn evict_lru(state: &mut CacheState) -> bool {
        while let Some(key) = state.lru_queue.pop_front() {
            if state.entries.remove(&key).is_some() {
                state.stats.evictions_lru += 1;
                debug!("Evicted cache entry: {} ({})", key, InvalidationReason::LruEvicted);
                return true;
            }
        }
        false
    }

    /// Internal: bulk-remove matching keys and record the invalidation
    async fn remove_matching<F>(&self, matches: F, reason: InvalidationReason) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let mut guard = self.inner.write().await;
        let state = &mut *guard;

        let matched: Vec<CacheKey> = state
            .entries
            .keys()
            .filter(|key| matches(key.as_str()))
            .cloned()
            .collect();

        for key in &matched {
            Self::remove_entry(state, key);
        }

        if !matched.is_empty() {
            state.stats.invalidations += matched.len() as u64;
            let event = InvalidationEvent::new(reason, matched.clone());
            info!("{}", event);
        }

        matched.len()
    }
}

/// Full cache state for export/import
///
/// In-memory debugging and transfer only; nothing is persisted across
/// process restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// When the snapshot was taken
    pub exported_at: DateTime<Utc>,

    /// Configuration at export time
    pub config: CacheConfig,

    /// Raw counters at export time
    pub stats: CacheStats,

    /// All entries, least recently accessed first
    pub entries: Vec<CacheEntry>,
}

impl CacheSnapshot {
    /// Serialize the snapshot to JSON
    pub fn to_json(&self) -> crate::error::Result<String> {
        serde_json::to_string(self).map_err(Into::into)
    }

    /// Deserialize a snapshot from JSON
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }
}
