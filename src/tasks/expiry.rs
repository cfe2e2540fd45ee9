//! Expiry Timers
//!
//! One tokio task per expiring entry. The task sleeps until the entry's
//! deadline, then removes the entry if it is still the one it was armed for.

use std::sync::Weak;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::cache::CacheStore;

// == Expiry Timer ==
/// Cancellable handle to a scheduled expiry.
///
/// Dropping the handle cancels the timer, so a removed or replaced entry
/// never leaves a live callback behind.
#[derive(Debug)]
pub struct ExpiryTimer {
    handle: JoinHandle<()>,
}

impl ExpiryTimer {
    /// Cancels the scheduled expiry.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ExpiryTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// == Expiry Scheduler ==
/// Spawns expiry timers that call back into the owning store.
///
/// Holds only a weak reference so pending timers never keep a dropped
/// cache alive.
#[derive(Debug, Clone)]
pub struct ExpiryScheduler {
    runtime: Handle,
    store: Weak<Mutex<CacheStore>>,
}

impl ExpiryScheduler {
    pub fn new(runtime: Handle, store: Weak<Mutex<CacheStore>>) -> Self {
        Self { runtime, store }
    }

    /// Schedules removal of `key` after `delay`, guarded by `entry_id`.
    pub fn schedule(&self, key: String, entry_id: u64, delay: Duration) -> ExpiryTimer {
        let store = self.store.clone();

        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;

            match store.upgrade() {
                Some(store) => {
                    store.lock().expire(&key, entry_id);
                }
                None => trace!("Expiry for '{}' fired after cache was dropped", key),
            }
        });

        ExpiryTimer { handle }
    }
}
