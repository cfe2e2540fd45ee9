//! Cache Store Module
//!
//! Main cache engine: key to entry mapping with insertion-order eviction
//! under a byte budget and per-entry TTL expiration.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use tracing::{debug, info, trace};

use crate::cache::{
    current_timestamp_ms, estimate_size, format_size, ttl_to_ms, CacheEntry, CacheOptions,
    CacheValue, InsertionOrder,
};
use crate::error::{CacheError, Result};
use crate::persistence::PersistedRecord;
use crate::tasks::{ExpiryScheduler, MirrorSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertMode {
    Overwrite,
    KeepExisting,
}

#[derive(Debug, Clone, Copy)]
enum Removal {
    Deleted,
    Evicted,
    Expired,
}

// == Cache Store ==
/// Cache storage with size-bounded eviction and TTL support.
///
/// The store is synchronous; callers serialize access (the facade keeps it
/// behind a mutex). Expiry timers and the persistence mirror are optional
/// hooks, so a bare store still expires entries lazily on access.
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    order: InsertionOrder,
    /// Expiring entries ordered by deadline, then entry id
    deadlines: BTreeMap<(u64, u64), String>,
    options: CacheOptions,
    /// Sum of the size estimates of every live entry
    used_bytes: usize,
    next_id: u64,
    expiry: Option<ExpiryScheduler>,
    mirror: Option<MirrorSender>,
    /// False until persisted entries have been replayed
    ready: bool,
    /// Keys mutated before replay; their persisted copies are ignored
    pending: HashSet<String>,
    /// `clean()` ran before replay; every persisted copy is discarded
    cleared_before_ready: bool,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a standalone store with no timers and no persistence.
    pub fn new(options: CacheOptions) -> Self {
        Self::with_hooks(options, None, None)
    }

    /// Creates a store wired to an expiry scheduler and persistence mirror.
    ///
    /// With a mirror attached the store starts not ready; [`restore`]
    /// marks it ready.
    ///
    /// [`restore`]: CacheStore::restore
    pub(crate) fn with_hooks(
        options: CacheOptions,
        expiry: Option<ExpiryScheduler>,
        mirror: Option<MirrorSender>,
    ) -> Self {
        let ready = mirror.is_none();
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            deadlines: BTreeMap::new(),
            options,
            used_bytes: 0,
            next_id: 0,
            expiry,
            mirror,
            ready,
            pending: HashSet::new(),
            cleared_before_ready: false,
        }
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    // == Put ==
    /// Stores a value, replacing any existing entry for the key.
    ///
    /// # Arguments
    /// * `key` - Non-empty key
    /// * `value` - Value to store; absent sentinels are rejected
    /// * `ttl` - TTL in seconds; `Some(0.0)` stores nothing, `None` uses
    ///   the default TTL
    pub fn put(&mut self, key: &str, value: CacheValue, ttl: Option<f64>) -> Result<()> {
        self.insert(key, value, ttl, InsertMode::Overwrite)
    }

    // == Set ==
    /// Stores a value only if the key has no live entry.
    pub fn set(&mut self, key: &str, value: CacheValue, ttl: Option<f64>) -> Result<()> {
        self.insert(key, value, ttl, InsertMode::KeepExisting)
    }

    fn insert(
        &mut self,
        key: &str,
        value: CacheValue,
        ttl: Option<f64>,
        mode: InsertMode,
    ) -> Result<()> {
        validate_key(key)?;
        validate_value(&value)?;
        let ttl = validate_ttl(ttl)?;

        if mode == InsertMode::KeepExisting {
            self.expire_if_due(key);
            if self.entries.contains_key(key) {
                debug!("Key '{}' already cached, set ignored", key);
                return Ok(());
            }
        }

        if ttl == Some(0.0) {
            debug!("Key '{}' stored with ttl 0, nothing cached", key);
            return Ok(());
        }

        if let Some(limit) = self.options.size_limit {
            let candidate = estimate_size(&value);
            if candidate as u64 > limit {
                debug!(
                    "Key '{}' needs {} bytes, over the {} byte limit; not cached",
                    key, candidate, limit
                );
                return Ok(());
            }
            self.make_room(candidate, limit);
        }

        // A zero default TTL means entries never expire
        let ttl_ms = ttl
            .or(self.options.default_ttl)
            .filter(|seconds| *seconds > 0.0)
            .map(ttl_to_ms);

        self.install(key.to_string(), value, ttl_ms, true);
        Ok(())
    }

    /// Evicts oldest-inserted entries until `candidate` more bytes fit.
    fn make_room(&mut self, candidate: usize, limit: u64) {
        self.purge_expired();

        while (self.used_bytes + candidate) as u64 > limit {
            let Some(oldest) = self.order.oldest().cloned() else {
                break;
            };
            debug!(
                "Evicting '{}' to fit {} bytes under the {} byte limit",
                oldest, candidate, limit
            );
            self.remove(&oldest, Removal::Evicted);
        }
    }

    /// Places an entry, cancelling the old timer first and arming a new one.
    fn install(&mut self, key: String, value: CacheValue, ttl_ms: Option<u64>, persist: bool) {
        if let Some(previous) = self.entries.get_mut(&key) {
            previous.cancel_timer();
        }

        self.next_id += 1;
        let id = self.next_id;
        let size = estimate_size(&value);
        let mut entry = CacheEntry::new(id, value, size, ttl_ms);

        if let (Some(ttl), Some(expiry)) = (ttl_ms, &self.expiry) {
            entry.arm(expiry.schedule(key.clone(), id, Duration::from_millis(ttl)));
        }

        if persist {
            if let Some(mirror) = &self.mirror {
                mirror.save(PersistedRecord {
                    key: key.clone(),
                    value: entry.value.clone(),
                    ttl: ttl_ms,
                    expire_at: entry.expires_at,
                });
            }
        }

        if !self.ready {
            self.pending.insert(key.clone());
        }

        if let Some(deadline) = entry.expires_at {
            self.deadlines.insert((deadline, id), key.clone());
        }

        match self.entries.insert(key.clone(), entry) {
            Some(previous) => {
                self.used_bytes -= previous.size;
                self.forget_deadline(&previous);
            }
            None => self.order.push(&key),
        }
        self.used_bytes += size;

        trace!("Cached '{}' ({} bytes, ttl {:?} ms)", key, size, ttl_ms);
    }

    // == Get ==
    /// Retrieves a value by key; `None` when absent or expired.
    pub fn get(&mut self, key: &str) -> Result<Option<CacheValue>> {
        validate_key(key)?;
        self.expire_if_due(key);
        Ok(self.entries.get(key).map(|entry| entry.value.clone()))
    }

    // == Has ==
    /// Returns true if a live entry exists for the key.
    pub fn has(&mut self, key: &str) -> Result<bool> {
        validate_key(key)?;
        self.expire_if_due(key);
        Ok(self.entries.contains_key(key))
    }

    // == Delete ==
    /// Removes an entry by key. Deleting a missing key is not an error.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;
        if self.remove(key, Removal::Deleted).is_none() {
            // Nothing in memory, but a record may still be on disk
            self.mirror_delete(key);
        }
        Ok(())
    }

    // == Clean ==
    /// Deletes every entry.
    pub fn clean(&mut self) {
        let keys = self.order.snapshot();
        let count = keys.len();
        for key in keys {
            self.remove(&key, Removal::Deleted);
        }

        if !self.ready {
            self.cleared_before_ready = true;
        }
        debug!("Cleaned {} entries", count);
    }

    // == Keys ==
    /// Returns live keys in insertion order.
    pub fn keys(&mut self) -> Vec<String> {
        self.purge_expired();
        self.order.snapshot()
    }

    // == Count ==
    pub fn count(&mut self) -> usize {
        self.purge_expired();
        self.entries.len()
    }

    // == Size ==
    /// Returns the summed size estimate of all live values.
    pub fn size(&mut self) -> usize {
        self.purge_expired();
        self.used_bytes
    }

    pub fn size_text(&mut self) -> String {
        format_size(self.size() as u64)
    }

    // == Timers ==
    /// Cancels every scheduled expiry. Entries stay and still expire lazily.
    pub fn stop_timers(&mut self) {
        let mut stopped = 0;
        for entry in self.entries.values_mut() {
            if entry.has_timer() {
                entry.cancel_timer();
                stopped += 1;
            }
        }
        info!("Stopped {} expiry timers", stopped);
    }

    /// Timer callback: removes `key` only if `entry_id` is still current.
    pub(crate) fn expire(&mut self, key: &str, entry_id: u64) {
        if self.entry_id(key) == Some(entry_id) {
            self.remove(key, Removal::Expired);
        } else {
            trace!("Ignoring stale expiry for '{}'", key);
        }
    }

    pub(crate) fn entry_id(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.id)
    }

    // == Restore ==
    /// Replays persisted records and marks the store ready.
    ///
    /// Returns keys whose records should be deleted from disk: expired ones,
    /// or all of them when the store was cleaned before replay. Keys written
    /// or deleted before replay keep their in-memory state.
    pub(crate) fn restore(&mut self, records: Vec<PersistedRecord>) -> Vec<String> {
        let now = current_timestamp_ms();
        let mut stale = Vec::new();

        for record in records {
            if self.cleared_before_ready {
                stale.push(record.key);
                continue;
            }
            if self.pending.contains(&record.key) {
                trace!("Keeping in-memory state for '{}'", record.key);
                continue;
            }
            if record.is_expired_at(now) || record.key.is_empty() || record.value.is_absent() {
                stale.push(record.key);
                continue;
            }

            if let Some(limit) = self.options.size_limit {
                let candidate = estimate_size(&record.value);
                if candidate as u64 > limit {
                    debug!("Persisted '{}' exceeds the size limit; skipped", record.key);
                    continue;
                }
                self.make_room(candidate, limit);
            }

            let remaining = record.remaining_ms(now);
            self.install(record.key, record.value, remaining, false);
        }

        self.ready = true;
        self.pending.clear();
        self.cleared_before_ready = false;
        stale
    }

    // == Internals ==
    fn remove(&mut self, key: &str, cause: Removal) -> Option<CacheEntry> {
        let mut entry = self.entries.remove(key)?;
        entry.cancel_timer();
        self.order.remove(key);
        self.forget_deadline(&entry);
        self.used_bytes -= entry.size;
        self.mirror_delete(key);

        trace!("Removed '{}' ({:?})", key, cause);
        Some(entry)
    }

    fn mirror_delete(&mut self, key: &str) {
        if let Some(mirror) = &self.mirror {
            mirror.delete(key);
        }
        if !self.ready {
            self.pending.insert(key.to_string());
        }
    }

    fn expire_if_due(&mut self, key: &str) {
        if self.entries.get(key).is_some_and(CacheEntry::is_expired) {
            self.remove(key, Removal::Expired);
        }
    }

    /// Removes every entry whose deadline has passed, earliest first.
    fn purge_expired(&mut self) {
        let now = current_timestamp_ms();
        let mut due = Vec::new();
        for (&(deadline, _), key) in &self.deadlines {
            if deadline > now {
                break;
            }
            due.push(key.clone());
        }

        for key in due {
            self.remove(&key, Removal::Expired);
        }
    }

    fn forget_deadline(&mut self, entry: &CacheEntry) {
        if let Some(deadline) = entry.expires_at {
            self.deadlines.remove(&(deadline, entry.id));
        }
    }
}

// == Validation ==
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey);
    }
    Ok(())
}

fn validate_value(value: &CacheValue) -> Result<()> {
    match value {
        CacheValue::Null => Err(CacheError::InvalidValue(
            "can't store 'null' as a cache value".to_string(),
        )),
        CacheValue::Undefined => Err(CacheError::InvalidValue(
            "can't store 'undefined' as a cache value".to_string(),
        )),
        _ if has_non_finite_number(value) => Err(CacheError::InvalidValue(
            "can't store NaN or infinite numbers as a cache value".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Non-finite numbers have no JSON form, so they could not be persisted.
fn has_non_finite_number(value: &CacheValue) -> bool {
    match value {
        CacheValue::Number(n) => !n.is_finite(),
        CacheValue::Sequence(items) => items.iter().any(has_non_finite_number),
        CacheValue::Mapping(map) => map.values().any(has_non_finite_number),
        _ => false,
    }
}

fn validate_ttl(ttl: Option<f64>) -> Result<Option<f64>> {
    match ttl {
        Some(seconds) if !seconds.is_finite() => Err(CacheError::InvalidTtl(format!(
            "'{}' is not a number",
            seconds
        ))),
        Some(seconds) if seconds < 0.0 => Err(CacheError::InvalidTtl(format!(
            "expiration time '{}' can't be negative",
            seconds
        ))),
        other => Ok(other),
    }
}
