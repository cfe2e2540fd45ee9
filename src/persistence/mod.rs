//! Persistence Module
//!
//! Durable file mirror of cache contents, replayed at startup.

mod record;
mod storage;

pub use record::PersistedRecord;
pub use storage::{hash_key, Storage};
