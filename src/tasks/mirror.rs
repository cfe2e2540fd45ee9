//! Persistence Mirror Task
//!
//! Single writer that owns all durable I/O for a cache. It first replays
//! stored records into the cache, then applies queued saves and deletes in
//! the order they were issued.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheEvents, CacheStore};
use crate::persistence::{PersistedRecord, Storage};

// == Mirror Operations ==
#[derive(Debug)]
pub enum MirrorOp {
    Save(PersistedRecord),
    Delete(String),
    /// Acknowledged once every earlier operation has been applied
    Flush(oneshot::Sender<()>),
}

// == Mirror Sender ==
/// Queue handle used by the store to mirror mutations.
///
/// Sends never block; the caller does not wait for the disk.
#[derive(Debug, Clone)]
pub struct MirrorSender {
    tx: mpsc::UnboundedSender<MirrorOp>,
}

impl MirrorSender {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<MirrorOp>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn save(&self, record: PersistedRecord) {
        self.send(MirrorOp::Save(record));
    }

    pub fn delete(&self, key: &str) {
        self.send(MirrorOp::Delete(key.to_string()));
    }

    /// Returns a receiver that resolves once the queue up to now is drained.
    pub fn flush(&self) -> oneshot::Receiver<()> {
        let (done, rx) = oneshot::channel();
        self.send(MirrorOp::Flush(done));
        rx
    }

    fn send(&self, op: MirrorOp) {
        if self.tx.send(op).is_err() {
            warn!("Persistence mirror has stopped; operation dropped");
        }
    }
}

/// Spawns the mirror writer for one cache.
///
/// # Arguments
/// * `runtime` - Runtime to spawn on
/// * `storage` - Durable record storage
/// * `store` - Weak reference to the cache store to replay into
/// * `events` - Receives the load notification and any I/O failure
/// * `rx` - Queue fed by [`MirrorSender`]
///
/// # Returns
/// A JoinHandle; the task ends once every sender is dropped.
pub fn spawn_mirror_task(
    runtime: &Handle,
    storage: Storage,
    store: Weak<Mutex<CacheStore>>,
    events: Arc<CacheEvents>,
    mut rx: mpsc::UnboundedReceiver<MirrorOp>,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        replay(&storage, &store, &events).await;

        while let Some(op) = rx.recv().await {
            let result = match op {
                MirrorOp::Save(record) => storage.save(&record).await,
                MirrorOp::Delete(key) => storage.delete(&key).await,
                MirrorOp::Flush(done) => {
                    let _ = done.send(());
                    Ok(())
                }
            };

            if let Err(e) = result {
                events.emit_error(&e);
            }
        }

        debug!("Persistence mirror for {} stopped", storage.dir().display());
    })
}

/// Loads stored records into the store, removes the stale ones from disk
/// and fires the load notification.
async fn replay(storage: &Storage, store: &Weak<Mutex<CacheStore>>, events: &CacheEvents) {
    info!("Loading persisted entries from {}", storage.dir().display());

    let records = match storage.entries_by_age().await {
        Ok(records) => records,
        Err(e) => {
            events.emit_error(&e);
            Vec::new()
        }
    };
    let found = records.len();

    let stale = match store.upgrade() {
        Some(store) => store.lock().restore(records),
        None => {
            debug!("Cache dropped before persisted entries were loaded");
            return;
        }
    };

    for key in &stale {
        if let Err(e) = storage.delete(key).await {
            events.emit_error(&e);
        }
    }

    info!(
        "Persisted entries loaded: {} found, {} dropped",
        found,
        stale.len()
    );
    events.emit_load();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheOptions, CacheValue};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_mirror_applies_operations_in_order() {
        let tmp = TempDir::new().unwrap();
        let storage = Storage::new(tmp.path());
        let store = Arc::new(Mutex::new(CacheStore::new(CacheOptions::default())));
        let events = Arc::new(CacheEvents::new(false));
        let (sender, rx) = MirrorSender::channel();

        spawn_mirror_task(
            &Handle::current(),
            storage.clone(),
            Arc::downgrade(&store),
            events.clone(),
            rx,
        );

        sender.save(PersistedRecord::new("a", CacheValue::from(1), None));
        sender.save(PersistedRecord::new("b", CacheValue::from(2), None));
        sender.delete("a");
        sender.flush().await.unwrap();

        assert!(events.is_loaded());
        assert_eq!(storage.get("a").await.unwrap(), None);
        assert_eq!(
            storage.get("b").await.unwrap().map(|r| r.value),
            Some(CacheValue::from(2))
        );
    }

    #[tokio::test]
    async fn test_mirror_reports_failures() {
        let tmp = TempDir::new().unwrap();
        // A regular file where the storage directory should be
        let blocker = tmp.path().join("blocked");
        std::fs::write(&blocker, b"").unwrap();

        let storage = Storage::new(&blocker);
        let store = Arc::new(Mutex::new(CacheStore::new(CacheOptions::default())));
        let events = Arc::new(CacheEvents::new(false));
        let failures = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = failures.clone();
        events.on_error(move |_| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        let (sender, rx) = MirrorSender::channel();
        spawn_mirror_task(
            &Handle::current(),
            storage,
            Arc::downgrade(&store),
            events.clone(),
            rx,
        );

        sender.save(PersistedRecord::new("k", CacheValue::from("v"), None));
        sender.flush().await.unwrap();

        assert!(events.is_loaded());
        assert!(failures.load(std::sync::atomic::Ordering::SeqCst) >= 1);
    }
}
