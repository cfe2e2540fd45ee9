//! Cache Events Module
//!
//! Observer registry for the one-time "load" notification and for
//! persistence failures.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::error;

use crate::error::CacheError;

type LoadObserver = Box<dyn FnOnce() + Send>;
type ErrorObserver = Arc<dyn Fn(&CacheError) + Send + Sync>;

// == Cache Events ==
/// Observers owned by one cache instance.
pub struct CacheEvents {
    loaded: watch::Sender<bool>,
    load_observers: Mutex<Vec<LoadObserver>>,
    error_observers: Mutex<Vec<ErrorObserver>>,
}

impl CacheEvents {
    /// Creates the registry; `loaded` is true when there is nothing to replay.
    pub fn new(loaded: bool) -> Self {
        let (tx, _rx) = watch::channel(loaded);
        Self {
            loaded: tx,
            load_observers: Mutex::new(Vec::new()),
            error_observers: Mutex::new(Vec::new()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        *self.loaded.borrow()
    }

    // == Load ==
    /// Registers a load callback. Runs immediately if loading already finished.
    pub fn on_load<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut observers = self.load_observers.lock();
        if self.is_loaded() {
            drop(observers);
            callback();
        } else {
            observers.push(Box::new(callback));
        }
    }

    /// Fires the load notification. Only the first call has any effect.
    pub fn emit_load(&self) {
        let observers = {
            let mut guard = self.load_observers.lock();
            if self.is_loaded() {
                return;
            }
            self.loaded.send_replace(true);
            std::mem::take(&mut *guard)
        };

        for callback in observers {
            callback();
        }
    }

    /// Resolves once the load notification has fired.
    pub async fn wait_loaded(&self) {
        let mut rx = self.loaded.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|loaded| *loaded).await;
    }

    // == Errors ==
    /// Registers a callback for persistence failures.
    pub fn on_error<F>(&self, callback: F)
    where
        F: Fn(&CacheError) + Send + Sync + 'static,
    {
        self.error_observers.lock().push(Arc::new(callback));
    }

    /// Logs `err` and hands it to every error observer.
    pub fn emit_error(&self, err: &CacheError) {
        error!("Persistence mirror failure: {}", err);

        let observers = self.error_observers.lock().clone();
        for callback in observers {
            callback(err);
        }
    }
}

impl std::fmt::Debug for CacheEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEvents")
            .field("loaded", &self.is_loaded())
            .field("load_observers", &self.load_observers.lock().len())
            .field("error_observers", &self.error_observers.lock().len())
            .finish()
    }
}
