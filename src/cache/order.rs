//! Insertion Order Module
//!
//! Tracks the order keys were first inserted, which drives eviction.

use std::collections::{BTreeMap, HashMap};

// == Insertion Order ==
/// Tracks key insertion order for size-bounded eviction.
///
/// Each key gets a monotonically increasing sequence number when pushed:
/// - Lowest sequence = Oldest inserted
/// - Highest sequence = Newest inserted
///
/// Reads never reorder keys, and overwriting a tracked key keeps its slot.
/// Push, remove and oldest are all O(log n).
#[derive(Debug, Default)]
pub struct InsertionOrder {
    slots: BTreeMap<u64, String>,
    positions: HashMap<String, u64>,
    next_seq: u64,
}

impl InsertionOrder {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Push ==
    /// Appends a newly inserted key. Pushing a tracked key keeps its slot.
    pub fn push(&mut self, key: &str) {
        if self.positions.contains_key(key) {
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.slots.insert(seq, key.to_string());
        self.positions.insert(key.to_string(), seq);
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        if let Some(seq) = self.positions.remove(key) {
            self.slots.remove(&seq);
        }
    }

    // == Oldest ==
    /// Returns the earliest inserted key still tracked.
    pub fn oldest(&self) -> Option<&String> {
        self.slots.values().next()
    }

    // == Iter ==
    /// Iterates keys from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.slots.values()
    }

    // == Snapshot ==
    /// Copies the current keys, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.slots.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }
}
