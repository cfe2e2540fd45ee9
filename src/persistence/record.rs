//! Persisted Record
//!
//! On-disk document written for each cached key.

use serde::{Deserialize, Serialize};

use crate::cache::{current_timestamp_ms, CacheValue};

/// One key's durable copy.
///
/// Serialized as `{ "key", "value", "ttl", "expireAt" }`, where `ttl` is the
/// lifetime in milliseconds at write time and `expireAt` the absolute
/// deadline in Unix milliseconds. Both are omitted for entries that never
/// expire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecord {
    pub key: String,
    pub value: CacheValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<u64>,
}

impl PersistedRecord {
    pub fn new(key: impl Into<String>, value: CacheValue, ttl_ms: Option<u64>) -> Self {
        let expire_at = ttl_ms.map(|ttl| current_timestamp_ms().saturating_add(ttl));
        Self {
            key: key.into(),
            value,
            ttl: ttl_ms,
            expire_at,
        }
    }

    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        self.expire_at.is_some_and(|deadline| now_ms >= deadline)
    }

    /// Milliseconds left before the deadline, `None` when never expiring.
    pub fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.expire_at
            .map(|deadline| deadline.saturating_sub(now_ms))
    }
}
