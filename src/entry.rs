//! Cache entry management with TTL support

use crate::types::{CacheKey, CacheValue, MetadataReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cache entry with TTL and access metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cache key
    pub key: CacheKey,

    /// The cached value
    pub value: CacheValue,

    /// Entry metadata
    pub metadata: CacheMetadata,
}

impl CacheEntry {
    /// Create a new cache entry with the given TTL
    ///
    /// A `set` on an existing key constructs a fresh entry, so value and
    /// metadata are always replaced wholesale.
    pub fn new(key: CacheKey, value: CacheValue, ttl: Duration) -> Self {
        let now = Utc::now();
        let expires_at =
            now + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::seconds(300));
        let size_bytes = serde_json::to_string(&value).map(|s| s.len()).unwrap_or(0);

        Self {
            key,
            value,
            metadata: CacheMetadata {
                created_at: now,
                last_accessed: now,
                expires_at,
                ttl,
                access_count: 0,
                size_bytes,
            },
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.metadata.expires_at
    }

    /// Get time until expiration
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Utc::now();
        if now > self.metadata.expires_at {
            None
        } else {
            (self.metadata.expires_at - now).to_std().ok()
        }
    }

    /// Mark the entry as accessed (updates access time and count)
    pub fn mark_accessed(&mut self) {
        self.metadata.last_accessed = Utc::now();
        self.metadata.access_count += 1;
    }

    /// Get the age of the entry
    pub fn age(&self) -> Duration {
        (Utc::now() - self.metadata.created_at)
            .to_std()
            .unwrap_or(Duration::from_secs(0))
    }

    /// Build a diagnostic snapshot of this entry's metadata
    pub fn report(&self) -> MetadataReport {
        MetadataReport {
            key: self.key.clone(),
            created_at: self.metadata.created_at,
            expires_at: self.metadata.expires_at,
            last_accessed: self.metadata.last_accessed,
            ttl: self.metadata.ttl,
            age: self.age(),
            remaining_ttl: self.time_until_expiration(),
            access_count: self.metadata.access_count,
            size_bytes: self.metadata.size_bytes,
            expired: self.is_expired(),
        }
    }
}

/// Metadata associated with a cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// When the entry was created
    pub created_at: DateTime<Utc>,

    /// Last access time (for LRU tracking)
    pub last_accessed: DateTime<Utc>,

    /// When the entry expires
    pub expires_at: DateTime<Utc>,

    /// TTL the entry was stored with
    pub ttl: Duration,

    /// Number of times this entry has been read
    pub access_count: u64,

    /// Serialized size of the value in bytes
    pub size_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;

    #[test]
    fn test_cache_entry_creation() {
        let entry = CacheEntry::new(
            "agents:t1:detail:5".to_string(),
            json!({"id": 5, "name": "Recovery agent"}),
            Duration::from_secs(300),
        );

        assert_eq!(entry.key, "agents:t1:detail:5");
        assert_eq!(entry.value["id"], 5);
        assert!(!entry.is_expired());
        assert_eq!(entry.metadata.access_count, 0);
        assert!(entry.metadata.size_bytes > 0);
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(
            "k".to_string(),
            json!("v"),
            Duration::from_millis(50),
        );

        assert!(!entry.is_expired());
        sleep(Duration::from_millis(80));
        assert!(entry.is_expired());
        assert!(entry.time_until_expiration().is_none());
    }

    #[test]
    fn test_mark_accessed() {
        let mut entry = CacheEntry::new(
            "k".to_string(),
            json!("v"),
            Duration::from_secs(300),
        );

        let initial_time = entry.metadata.last_accessed;

        sleep(Duration::from_millis(10));
        entry.mark_accessed();
        entry.mark_accessed();

        assert_eq!(entry.metadata.access_count, 2);
        assert!(entry.metadata.last_accessed > initial_time);
    }

    #[test]
    fn test_time_until_expiration() {
        let entry = CacheEntry::new(
            "k".to_string(),
            json!("v"),
            Duration::from_secs(300),
        );

        let time_left = entry.time_until_expiration();
        assert!(time_left.is_some());
        assert!(time_left.unwrap() <= Duration::from_secs(300));
    }

    #[test]
    fn test_metadata_report() {
        let mut entry = CacheEntry::new(
            "opportunities:t1:list:{}".to_string(),
            json!([{"id": 1}]),
            Duration::from_secs(300),
        );
        entry.mark_accessed();

        let report = entry.report();
        assert_eq!(report.key, "opportunities:t1:list:{}");
        assert_eq!(report.access_count, 1);
        assert_eq!(report.ttl, Duration::from_secs(300));
        assert!(!report.expired);
        assert!(report.remaining_ttl.is_some());
    }

    #[test]
    fn test_age() {
        let entry = CacheEntry::new("k".to_string(), json!("v"), Duration::from_secs(300));

        sleep(Duration::from_millis(10));
        assert!(entry.age() >= Duration::from_millis(10));
    }
}
