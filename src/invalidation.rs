//! Invalidation matching and diagnostics
//!
//! Bulk invalidation matches keys against a tenant/namespace prefix anchored
//! at a segment boundary: `"agents"` covers `agents:u1:...` but never
//! `agent:u1:...` or vice versa. Plain substring containment is deliberately
//! not offered; it over-invalidates whenever one namespace's name is a
//! prefix of another's.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Segment-anchored prefix match
///
/// A key matches when it equals the pattern or starts with `pattern + ":"`.
pub fn pattern_matches(key: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    match key.strip_prefix(pattern) {
        Some(rest) => rest.is_empty() || rest.starts_with(':'),
        None => false,
    }
}

/// Reason a set of keys left the cache
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvalidationReason {
    /// Entry expired based on TTL
    Expired,

    /// Explicit delete of a single key
    Manual,

    /// Matched a tenant/namespace pattern
    PatternMatch { pattern: String },

    /// Matched a regular expression against the full key
    RegexMatch { pattern: String },

    /// Matched a namespace prefix
    NamespaceMatch { namespace: String },

    /// Evicted by LRU policy at capacity
    LruEvicted,

    /// Whole cache cleared
    Cleared,
}

impl fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidationReason::Expired => write!(f, "TTL expired"),
            InvalidationReason::Manual => write!(f, "manual delete"),
            InvalidationReason::PatternMatch { pattern } => {
                write!(f, "pattern match: {}", pattern)
            }
            InvalidationReason::RegexMatch { pattern } => {
                write!(f, "regex match: {}", pattern)
            }
            InvalidationReason::NamespaceMatch { namespace } => {
                write!(f, "namespace match: {}", namespace)
            }
            InvalidationReason::LruEvicted => write!(f, "LRU eviction"),
            InvalidationReason::Cleared => write!(f, "cache cleared"),
        }
    }
}

/// Diagnostic record of one invalidation pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationEvent {
    /// Unique event identifier
    pub id: Uuid,

    /// Reason for invalidation
    pub reason: InvalidationReason,

    /// When the invalidation occurred
    pub timestamp: DateTime<Utc>,

    /// Keys that were invalidated
    pub keys: Vec<String>,

    /// Additional context
    pub context: Option<String>,
}

impl InvalidationEvent {
    /// Create a new invalidation event
    pub fn new(reason: InvalidationReason, keys: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            reason,
            timestamp: Utc::now(),
            keys,
            context: None,
        }
    }

    /// Add context to the event
    pub fn with_context(mut self, context: String) -> Self {
        self.context = Some(context);
        self
    }
}

impl fmt::Display for InvalidationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalidation {} ({}): {} keys",
            self.id,
            self.reason,
            self.keys.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_matches_anchored() {
        assert!(pattern_matches("agents:u1:list:{}", "agents"));
        assert!(pattern_matches("agents:u1:list:{}", "agents:u1"));
        assert!(pattern_matches("agents:u1", "agents:u1"));

        // Not anchored at a segment boundary
        assert!(!pattern_matches("agents:u1:list:{}", "agent"));
        assert!(!pattern_matches("agents:u1:list:{}", "agents:u"));
        assert!(!pattern_matches("opportunities:u1:list:{}", "agents"));
    }

    #[test]
    fn test_pattern_matches_empty_pattern() {
        assert!(!pattern_matches("agents:u1:list:{}", ""));
    }

    #[test]
    fn test_invalidation_reason_display() {
        assert_eq!(InvalidationReason::Expired.to_string(), "TTL expired");

        let reason = InvalidationReason::PatternMatch {
            pattern: "agents:u1".to_string(),
        };
        assert!(reason.to_string().contains("agents:u1"));

        let reason = InvalidationReason::NamespaceMatch {
            namespace: "opportunities".to_string(),
        };
        assert!(reason.to_string().contains("opportunities"));
    }

    #[test]
    fn test_invalidation_event() {
        let event = InvalidationEvent::new(
            InvalidationReason::Expired,
            vec!["key1".to_string(), "key2".to_string()],
        )
        .with_context("expiry sweep".to_string());

        assert_eq!(event.keys.len(), 2);
        assert_eq!(event.context, Some("expiry sweep".to_string()));
        assert!(event.to_string().contains("2 keys"));
    }
}
