//! Cache Facade
//!
//! Public handle composing the store, expiry timers, the persistence mirror
//! and the load/error observers.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::info;

use crate::cache::{CacheEvents, CacheOptions, CacheStore, CacheValue};
use crate::error::{CacheError, Result};
use crate::persistence::Storage;
use crate::tasks::{spawn_mirror_task, ExpiryScheduler, MirrorSender};

// == Cache ==
/// Shared, clonable cache handle.
///
/// Must be created inside a tokio runtime: expiry timers and the
/// persistence mirror run as tasks on it. All clones share one store.
///
/// # Example
/// ```no_run
/// use mini_cache::{Cache, CacheOptions};
///
/// # async fn demo() -> mini_cache::error::Result<()> {
/// let cache = Cache::new(CacheOptions::new().with_limit(1024).persistent(true))?;
/// cache.ready().await;
///
/// cache.put("greeting", "hello", Some(60.0))?;
/// assert!(cache.has("greeting")?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Cache {
    store: Arc<Mutex<CacheStore>>,
    events: Arc<CacheEvents>,
    mirror: Option<MirrorSender>,
}

impl Cache {
    // == Constructor ==
    /// Validates `options` and starts the cache.
    ///
    /// With persistence enabled, stored records are replayed in the
    /// background; the "load" notification fires when that completes.
    /// Without persistence the cache is ready immediately.
    pub fn new(options: CacheOptions) -> Result<Self> {
        options.validate()?;
        let runtime = Handle::try_current().map_err(|_| CacheError::Runtime)?;

        let persistent = options.persistent;
        let storage_dir = options.storage_dir.clone();
        let events = Arc::new(CacheEvents::new(!persistent));

        let (mirror, queue) = if persistent {
            let (sender, rx) = MirrorSender::channel();
            (Some(sender), Some(rx))
        } else {
            (None, None)
        };

        let store = Arc::new_cyclic(|weak| {
            let expiry = ExpiryScheduler::new(runtime.clone(), weak.clone());
            Mutex::new(CacheStore::with_hooks(options, Some(expiry), mirror.clone()))
        });

        if let Some(rx) = queue {
            info!("Persistence enabled at {}", storage_dir.display());
            spawn_mirror_task(
                &runtime,
                Storage::new(storage_dir),
                Arc::downgrade(&store),
                events.clone(),
                rx,
            );
        }

        Ok(Self {
            store,
            events,
            mirror,
        })
    }

    // == Mutations ==
    /// Stores `value`, overwriting any existing entry.
    ///
    /// `ttl` is in seconds; `Some(0.0)` stores nothing and `None` falls back
    /// to the default TTL.
    pub fn put(&self, key: &str, value: impl Into<CacheValue>, ttl: Option<f64>) -> Result<()> {
        self.store.lock().put(key, value.into(), ttl)
    }

    /// Stores `value` only if `key` has no live entry.
    pub fn set(&self, key: &str, value: impl Into<CacheValue>, ttl: Option<f64>) -> Result<()> {
        self.store.lock().set(key, value.into(), ttl)
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        self.store.lock().delete(key)
    }

    pub fn clean(&self) {
        self.store.lock().clean();
    }

    // == Reads ==
    pub fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        self.store.lock().get(key)
    }

    pub fn has(&self, key: &str) -> Result<bool> {
        self.store.lock().has(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.store.lock().keys()
    }

    pub fn count(&self) -> usize {
        self.store.lock().count()
    }

    pub fn size(&self) -> usize {
        self.store.lock().size()
    }

    pub fn size_text(&self) -> String {
        self.store.lock().size_text()
    }

    // == Lifecycle ==
    /// True once persisted entries have been replayed and "load" has fired.
    pub fn is_ready(&self) -> bool {
        self.events.is_loaded()
    }

    /// Waits for the "load" notification.
    pub async fn ready(&self) {
        self.events.wait_loaded().await;
    }

    /// Registers a callback for the one-time "load" notification.
    ///
    /// A callback registered after loading finished runs immediately.
    pub fn on_load<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.events.on_load(callback);
    }

    /// Registers a callback for persistence failures.
    pub fn on_error<F>(&self, callback: F)
    where
        F: Fn(&CacheError) + Send + Sync + 'static,
    {
        self.events.on_error(callback);
    }

    /// Waits until every mirrored write issued so far reached the disk.
    pub async fn flush(&self) {
        if let Some(mirror) = &self.mirror {
            // An error means the writer already stopped; nothing to wait for.
            let _ = mirror.flush().await;
        }
    }

    /// Cancels all pending expiry timers.
    pub fn stop_timers(&self) {
        self.store.lock().stop_timers();
    }

    /// Stops timers and drains the persistence mirror.
    pub async fn close(&self) {
        self.stop_timers();
        self.flush().await;
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("events", &self.events)
            .field("persistent", &self.mirror.is_some())
            .finish()
    }
}
