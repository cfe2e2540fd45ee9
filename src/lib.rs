//! Mini Cache - An in-process key/value cache
//!
//! Size-bounded storage with per-entry TTL expiry, oldest-first eviction and
//! optional one-file-per-key persistence, plus a small HTTP front-end.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod persistence;
pub mod tasks;

pub use api::AppState;
pub use cache::{Cache, CacheOptions, CacheValue};
pub use config::Config;
pub use error::{CacheError, Result};
