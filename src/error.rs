//! Error types for cache operations
//!
//! The public cache surface is best-effort and never propagates these to
//! callers; they exist for the fallible seams (configuration validation,
//! snapshot encode/decode) and for diagnostic logging.

use thiserror::Error;

/// Main error type for cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// Malformed or empty cache key
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::SerializationError(e.to_string())
    }
}

impl From<String> for CacheError {
    fn from(s: String) -> Self {
        CacheError::Other(s)
    }
}

impl From<&str> for CacheError {
    fn from(s: &str) -> Self {
        CacheError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CacheError::InvalidKey("empty key".to_string());
        assert_eq!(error.to_string(), "Invalid cache key: empty key");

        let error = CacheError::ConfigError("max_entries must be greater than 0".to_string());
        assert!(error.to_string().contains("max_entries"));
    }

    #[test]
    fn test_error_conversion() {
        let error: CacheError = "test error".into();
        assert!(matches!(error, CacheError::Other(_)));

        let error: CacheError = "test error".to_string().into();
        assert!(matches!(error, CacheError::Other(_)));

        let bad_json = serde_json::from_str::<serde_json::Value>("{not json");
        let error: CacheError = bad_json.unwrap_err().into();
        assert!(matches!(error, CacheError::SerializationError(_)));
    }
}
