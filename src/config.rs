//! Configuration for the cache system

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Named TTL tiers used by the data stores
///
/// Callers pick the tier matching the volatility of the data being cached:
/// list queries over frequently mutated stores take `Short`, detail records
/// take `Medium`, slow-moving reference data takes `Long`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TtlTier {
    /// Rapidly changing data (~3 minutes)
    Short,

    /// Standard store queries (~5 minutes)
    Medium,

    /// Slow-moving reference data (~30 minutes)
    Long,
}

impl TtlTier {
    /// Duration backing this tier
    pub fn duration(&self) -> Duration {
        match self {
            TtlTier::Short => Duration::from_secs(180),
            TtlTier::Medium => Duration::from_secs(300),
            TtlTier::Long => Duration::from_secs(1800),
        }
    }
}

/// Configuration for the request cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache
    /// Prevents unbounded memory growth
    pub max_entries: usize,

    /// Default time-to-live for entries stored without an explicit TTL
    pub default_ttl: Duration,

    /// Interval between automatic expiry sweeps
    pub cleanup_interval: Duration,

    /// TTL jitter factor (0.0 - 1.0)
    /// Adds random variation to prevent cache stampede; 0.0 disables it
    pub ttl_jitter: f64,

    /// Enable the periodic expiry sweep task
    pub enable_auto_cleanup: bool,

    /// Enable LRU eviction when the cache is at capacity
    pub enable_lru_eviction: bool,

    /// Gate verbose per-operation logging
    pub debug: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            // 1,000 entries default
            max_entries: 1_000,
            // 5 minute default TTL
            default_ttl: Duration::from_secs(300),
            // Sweep every 60 seconds
            cleanup_interval: Duration::from_secs(60),
            ttl_jitter: 0.0,
            enable_auto_cleanup: true,
            enable_lru_eviction: true,
            debug: false,
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(CacheError::ConfigError(
                "max_entries must be greater than 0".to_string(),
            ));
        }

        if self.default_ttl.is_zero() {
            return Err(CacheError::ConfigError(
                "default_ttl must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.ttl_jitter) {
            return Err(CacheError::ConfigError(
                "ttl_jitter must be between 0.0 and 1.0".to_string(),
            ));
        }

        Ok(())
    }

    /// Apply jitter to the TTL chosen for an entry
    ///
    /// The base is whichever TTL the caller picked (explicit tier or the
    /// configured default); a factor of 0.0 returns it unchanged.
    pub fn ttl_with_jitter(&self, base: Duration) -> Duration {
        if self.ttl_jitter <= 0.0 {
            return base;
        }

        let base_secs = base.as_secs_f64();
        let jitter_range = base_secs * self.ttl_jitter;
        let jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter_range;
        let final_secs = (base_secs + jitter).max(0.001);

        Duration::from_secs_f64(final_secs)
    }

    /// Shallow-merge a partial configuration into this one
    pub fn apply(&mut self, patch: CacheConfigPatch) {
        if let Some(max_entries) = patch.max_entries {
            self.max_entries = max_entries;
        }
        if let Some(default_ttl) = patch.default_ttl {
            self.default_ttl = default_ttl;
        }
        if let Some(cleanup_interval) = patch.cleanup_interval {
            self.cleanup_interval = cleanup_interval;
        }
        if let Some(ttl_jitter) = patch.ttl_jitter {
            self.ttl_jitter = ttl_jitter;
        }
        if let Some(enable_auto_cleanup) = patch.enable_auto_cleanup {
            self.enable_auto_cleanup = enable_auto_cleanup;
        }
        if let Some(enable_lru_eviction) = patch.enable_lru_eviction {
            self.enable_lru_eviction = enable_lru_eviction;
        }
        if let Some(debug) = patch.debug {
            self.debug = debug;
        }
    }

    /// Load configuration from environment variables
    ///
    /// Recognized variables: `RECOVERY_CACHE_MAX_ENTRIES`,
    /// `RECOVERY_CACHE_DEFAULT_TTL_SECS`, `RECOVERY_CACHE_CLEANUP_INTERVAL_SECS`,
    /// `RECOVERY_CACHE_TTL_JITTER`, `RECOVERY_CACHE_DEBUG`. Unset or
    /// unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_entries = std::env::var("RECOVERY_CACHE_MAX_ENTRIES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.max_entries);

        let default_ttl = std::env::var("RECOVERY_CACHE_DEFAULT_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.default_ttl);

        let cleanup_interval = std::env::var("RECOVERY_CACHE_CLEANUP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.cleanup_interval);

        let ttl_jitter = std::env::var("RECOVERY_CACHE_TTL_JITTER")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| (0.0..=1.0).contains(v))
            .unwrap_or(defaults.ttl_jitter);

        let debug = std::env::var("RECOVERY_CACHE_DEBUG")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(defaults.debug);

        Self {
            max_entries,
            default_ttl,
            cleanup_interval,
            ttl_jitter,
            debug,
            ..defaults
        }
    }
}

/// Partial configuration for runtime reconfiguration
///
/// Unset fields leave the current value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfigPatch {
    pub max_entries: Option<usize>,
    pub default_ttl: Option<Duration>,
    pub cleanup_interval: Option<Duration>,
    pub ttl_jitter: Option<f64>,
    pub enable_auto_cleanup: Option<bool>,
    pub enable_lru_eviction: Option<bool>,
    pub debug: Option<bool>,
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    max_entries: Option<usize>,
    default_ttl: Option<Duration>,
    cleanup_interval: Option<Duration>,
    ttl_jitter: Option<f64>,
    enable_auto_cleanup: Option<bool>,
    enable_lru_eviction: Option<bool>,
    debug: Option<bool>,
}

impl CacheConfigBuilder {
    /// Set maximum number of cache entries
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    /// Set default TTL for cache entries
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Set the expiry sweep interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Set TTL jitter factor (0.0 - 1.0)
    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.ttl_jitter = Some(jitter);
        self
    }

    /// Enable or disable the periodic sweep task
    pub fn enable_auto_cleanup(mut self, enable: bool) -> Self {
        self.enable_auto_cleanup = Some(enable);
        self
    }

    /// Enable or disable LRU eviction
    pub fn enable_lru_eviction(mut self, enable: bool) -> Self {
        self.enable_lru_eviction = Some(enable);
        self
    }

    /// Enable or disable verbose logging
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            max_entries: self.max_entries.unwrap_or(defaults.max_entries),
            default_ttl: self.default_ttl.unwrap_or(defaults.default_ttl),
            cleanup_interval: self.cleanup_interval.unwrap_or(defaults.cleanup_interval),
            ttl_jitter: self.ttl_jitter.unwrap_or(defaults.ttl_jitter),
            enable_auto_cleanup: self
                .enable_auto_cleanup
                .unwrap_or(defaults.enable_auto_cleanup),
            enable_lru_eviction: self
                .enable_lru_eviction
                .unwrap_or(defaults.enable_lru_eviction),
            debug: self.debug.unwrap_or(defaults.debug),
        }
    }
}

/// Preset configurations for common deployments
impl CacheConfig {
    /// Configuration for rapidly refreshing data such as dashboard aggregates
    pub fn realtime() -> Self {
        Self {
            max_entries: 500,
            default_ttl: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(15),
            ..Default::default()
        }
    }

    /// Configuration for memory-constrained environments
    pub fn small() -> Self {
        Self {
            max_entries: 250,
            default_ttl: Duration::from_secs(180),
            ..Default::default()
        }
    }

    /// Configuration for large tenant counts
    pub fn large() -> Self {
        Self {
            max_entries: 10_000,
            default_ttl: Duration::from_secs(600),
            ttl_jitter: 0.10,
            ..Default::default()
        }
    }
}
