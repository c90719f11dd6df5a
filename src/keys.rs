//! Typed key-convention layer for the data stores
//!
//! Cache keys follow the `{namespace}:{tenant}:{variant}` convention:
//!
//! - list queries: `{namespace}:{tenant}:list:{canonical-params-json}`
//! - detail records: `{namespace}:{tenant}:detail:{entity-id}`
//!
//! The store itself treats keys as opaque strings; these builders guarantee
//! the convention by construction so that tenant-scoped invalidation cannot
//! miss a segment. Query parameters are canonicalized (recursively sorted
//! object keys) so two logically identical queries always produce the same
//! key and different filter sets never collide.

use crate::types::CacheKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Namespaces of the CRM data stores
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreNamespace {
    /// Recovery opportunities (abandoned carts, failed payments)
    Opportunities,

    /// AI recovery agents
    Agents,

    /// Funnel activity log
    Activities,

    /// Guarantee/refund program records
    Guarantees,

    /// Dashboard aggregates
    Dashboard,

    /// Caller-defined namespace
    Custom(String),
}

impl StoreNamespace {
    /// Create a custom namespace, sanitized to a single key segment
    pub fn custom(name: &str) -> Self {
        StoreNamespace::Custom(name.trim().to_lowercase().replace(':', "-"))
    }
}

impl fmt::Display for StoreNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreNamespace::Opportunities => write!(f, "opportunities"),
            StoreNamespace::Agents => write!(f, "agents"),
            StoreNamespace::Activities => write!(f, "activities"),
            StoreNamespace::Guarantees => write!(f, "guarantees"),
            StoreNamespace::Dashboard => write!(f, "dashboard"),
            StoreNamespace::Custom(s) => write!(f, "{}", s),
        }
    }
}

/// A fully scoped cache key: namespace, tenant, and query variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedKey {
    namespace: StoreNamespace,
    tenant: String,
    variant: KeyVariant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyVariant {
    List { params: String },
    Detail { id: String },
}

impl ScopedKey {
    /// Key for a list query with the given filter parameters
    pub fn list(namespace: StoreNamespace, tenant: &str, params: &Value) -> Self {
        Self {
            namespace,
            tenant: tenant.to_string(),
            variant: KeyVariant::List {
                params: canonical_params(params),
            },
        }
    }

    /// Key for a single entity's detail record
    pub fn detail(namespace: StoreNamespace, tenant: &str, id: impl fmt::Display) -> Self {
        Self {
            namespace,
            tenant: tenant.to_string(),
            variant: KeyVariant::Detail { id: id.to_string() },
        }
    }

    /// The tenant+namespace invalidation scope covering this key
    pub fn scope(&self) -> InvalidationScope {
        InvalidationScope {
            namespace: self.namespace.clone(),
            tenant: self.tenant.clone(),
        }
    }

    /// Render into the plain string key the store operates on
    pub fn into_key(self) -> CacheKey {
        self.to_string()
    }
}

impl fmt::Display for ScopedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant {
            KeyVariant::List { params } => {
                write!(f, "{}:{}:list:{}", self.namespace, self.tenant, params)
            }
            KeyVariant::Detail { id } => {
                write!(f, "{}:{}:detail:{}", self.namespace, self.tenant, id)
            }
        }
    }
}

/// Tenant+namespace prefix used to wipe every cached query after a mutation
///
/// Over-invalidation within the scope is acceptable; under-invalidation is
/// not, so mutations invalidate the whole scope rather than individual keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationScope {
    pub namespace: StoreNamespace,
    pub tenant: String,
}

impl InvalidationScope {
    pub fn new(namespace: StoreNamespace, tenant: &str) -> Self {
        Self {
            namespace,
            tenant: tenant.to_string(),
        }
    }
}

impl fmt::Display for InvalidationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.tenant)
    }
}

/// Deterministically serialize query parameters
///
/// Object keys are sorted recursively so parameter order at the call site
/// never produces a second key for the same logical query. Serialization
/// failure degrades to `{}` rather than erroring; the worst case is a
/// shared key for unencodable params, which only widens invalidation.
pub fn canonical_params(params: &Value) -> String {
    fn canonicalize(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), canonicalize(v)))
                    .collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
            other => other.clone(),
        }
    }

    serde_json::to_string(&canonicalize(params)).unwrap_or_else(|_| "{}".to_string())
}

/// First colon-delimited segment of a key, by the namespace convention
pub fn split_namespace(key: &str) -> &str {
    key.split(':').next().unwrap_or(key)
}
