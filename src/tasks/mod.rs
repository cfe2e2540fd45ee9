//! Background Tasks Module
//!
//! Contains the tasks that run alongside a cache instance.
//!
//! # Tasks
//! - Expiry: one timer per expiring entry
//! - Mirror: the single writer for persisted records, including startup replay

mod expiry;
mod mirror;

pub use expiry::{ExpiryScheduler, ExpiryTimer};
pub use mirror::{spawn_mirror_task, MirrorOp, MirrorSender};
