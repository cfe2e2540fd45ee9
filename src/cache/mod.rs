//! Cache Module
//!
//! Provides in-process caching with TTL expiration and size-bounded eviction.

mod entry;
mod events;
mod facade;
mod options;
mod order;
mod size;
mod store;
mod value;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, ttl_to_ms, CacheEntry};
pub use events::CacheEvents;
pub use facade::Cache;
pub use options::{CacheOptions, DEFAULT_STORAGE_DIR};
pub use order::InsertionOrder;
pub use size::{estimate_size, format_size, BOOLEAN_SIZE, NUMBER_SIZE};
pub use store::CacheStore;
pub use value::{CacheValue, SymbolValue};
