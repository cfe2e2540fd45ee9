//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::CacheValue;

/// Request body for the write operations (PUT /put, PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value; a missing value reads as `null` and is rejected
/// - `ttl`: Optional TTL in seconds (uses the cache default if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct WriteRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    #[serde(default)]
    pub value: Value,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<f64>,
}

impl WriteRequest {
    /// Converts the JSON payload into a cache value.
    pub fn cache_value(&self) -> CacheValue {
        CacheValue::from(self.value.clone())
    }
}
