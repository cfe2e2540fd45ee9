//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::cache::CacheValue;
use crate::tasks::ExpiryTimer;

// == Cache Entry ==
/// Represents a single cache entry with value and expiry metadata.
#[derive(Debug)]
pub struct CacheEntry {
    /// Identity of this entry; a replacement under the same key gets a new one
    pub id: u64,
    /// The stored value
    pub value: CacheValue,
    /// Cached size estimate of `value`
    pub size: usize,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
    /// Scheduled removal, present only while a timer is armed
    timer: Option<ExpiryTimer>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// # Arguments
    /// * `id` - Entry identity used to validate timer callbacks
    /// * `value` - The value to store
    /// * `size` - Size estimate of `value`
    /// * `ttl_ms` - Optional TTL in milliseconds
    pub fn new(id: u64, value: CacheValue, size: usize, ttl_ms: Option<u64>) -> Self {
        let expires_at = ttl_ms.map(|ttl| current_timestamp_ms().saturating_add(ttl));

        Self {
            id,
            value,
            size,
            expires_at,
            timer: None,
        }
    }

    // == Timer ==
    /// Arms the expiry timer, cancelling any timer already attached.
    pub fn arm(&mut self, timer: ExpiryTimer) {
        self.cancel_timer();
        self.timer = Some(timer);
    }

    /// Cancels the expiry timer if one is armed.
    pub fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }

    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal
    /// to the expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired (TTL elapsed)
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Converts a TTL in seconds to whole milliseconds, rounding up so that a
/// positive TTL never becomes zero.
pub fn ttl_to_ms(seconds: f64) -> u64 {
    (seconds * 1000.0).ceil() as u64
}
