//! Core type definitions for the cache system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Cache key type - an opaque string; the `{namespace}:{tenant}:...`
/// convention is guaranteed by the typed builders in [`crate::keys`],
/// not enforced here
pub type CacheKey = String;

/// Cache value type - a type-erased JSON payload (lists, objects, RPC results)
pub type CacheValue = serde_json::Value;

/// Raw performance counters for the cache
///
/// Counters only grow; current size and derived rates are computed on demand
/// by [`StatsReport`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheStats {
    /// Total number of cache hits
    pub hits: u64,

    /// Total number of cache misses
    pub misses: u64,

    /// Total number of successful writes
    pub sets: u64,

    /// Keys removed by pattern/regex/namespace invalidation
    pub invalidations: u64,

    /// Entries removed because their TTL elapsed
    pub evictions_ttl: u64,

    /// Entries removed by LRU eviction at capacity
    pub evictions_lru: u64,
}

impl CacheStats {
    /// Calculate cache hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Calculate miss rate as a percentage
    pub fn miss_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            100.0 - self.hit_rate()
        }
    }

    /// Calculate total evictions across both policies
    pub fn total_evictions(&self) -> u64 {
        self.evictions_ttl + self.evictions_lru
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, misses: {}, hit_rate: {:.2}%, sets: {}, invalidations: {}, evictions: {} }}",
            self.hits,
            self.misses,
            self.hit_rate(),
            self.sets,
            self.invalidations,
            self.total_evictions()
        )
    }
}

/// Point-in-time statistics snapshot returned by `stats()`
///
/// Derived purely from the raw counters and the current entry map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsReport {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub invalidations: u64,
    pub evictions_ttl: u64,
    pub evictions_lru: u64,

    /// Hit rate as a percentage of all lookups
    pub hit_rate: f64,

    /// Miss rate as a percentage of all lookups
    pub miss_rate: f64,

    /// Number of entries currently in the cache
    pub size: usize,

    /// Configured entry capacity
    pub max_size: usize,

    /// Fill level as a percentage of capacity
    pub utilization: f64,

    /// Best-effort serialized size of all cached values, in KB
    pub estimated_size_kb: f64,
}

impl StatsReport {
    /// Build a report from raw counters plus the current map state
    pub fn from_counters(
        stats: &CacheStats,
        size: usize,
        max_size: usize,
        estimated_size_bytes: usize,
    ) -> Self {
        let utilization = if max_size == 0 {
            0.0
        } else {
            (size as f64 / max_size as f64) * 100.0
        };

        Self {
            hits: stats.hits,
            misses: stats.misses,
            sets: stats.sets,
            invalidations: stats.invalidations,
            evictions_ttl: stats.evictions_ttl,
            evictions_lru: stats.evictions_lru,
            hit_rate: stats.hit_rate(),
            miss_rate: stats.miss_rate(),
            size,
            max_size,
            utilization,
            estimated_size_kb: estimated_size_bytes as f64 / 1024.0,
        }
    }

    /// Total evictions across both policies
    pub fn evictions(&self) -> u64 {
        self.evictions_ttl + self.evictions_lru
    }
}

/// Diagnostic snapshot for a single entry, returned by `metadata()`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataReport {
    /// The cache key
    pub key: CacheKey,

    /// When the entry was created
    pub created_at: DateTime<Utc>,

    /// When the entry expires
    pub expires_at: DateTime<Utc>,

    /// Last access time
    pub last_accessed: DateTime<Utc>,

    /// TTL the entry was stored with
    pub ttl: Duration,

    /// Time elapsed since creation
    pub age: Duration,

    /// Time left before expiry, if any
    pub remaining_ttl: Option<Duration>,

    /// Number of successful reads of this entry
    pub access_count: u64,

    /// Serialized size of the value in bytes
    pub size_bytes: usize,

    /// Whether the entry has already expired
    pub expired: bool,
}
