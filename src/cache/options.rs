//! Cache Options Module
//!
//! Construction-time configuration for a cache instance.

use std::path::PathBuf;

use crate::error::{CacheError, Result};

/// Default directory for persisted records, relative to the working directory.
pub const DEFAULT_STORAGE_DIR: &str = ".cache";

// == Cache Options ==
/// Options fixed when a cache is constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheOptions {
    /// TTL in seconds applied when an operation omits one. Zero means never.
    pub default_ttl: Option<f64>,
    /// Budget for the summed size estimate of all values, in bytes
    pub size_limit: Option<u64>,
    /// Mirror writes to durable storage and replay them at startup
    pub persistent: bool,
    /// Directory holding one record file per key
    pub storage_dir: PathBuf,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            default_ttl: None,
            size_limit: None,
            persistent: false,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
        }
    }
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, seconds: f64) -> Self {
        self.default_ttl = Some(seconds);
        self
    }

    pub fn with_limit(mut self, bytes: u64) -> Self {
        self.size_limit = Some(bytes);
        self
    }

    pub fn persistent(mut self, enabled: bool) -> Self {
        self.persistent = enabled;
        self
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    // == Validate ==
    /// Checks option invariants.
    ///
    /// The default TTL must be a finite, non-negative number.
    pub fn validate(&self) -> Result<()> {
        if let Some(ttl) = self.default_ttl {
            if !ttl.is_finite() {
                return Err(CacheError::InvalidOption(format!(
                    "ttl '{}' is not a number",
                    ttl
                )));
            }
            if ttl < 0.0 {
                return Err(CacheError::InvalidOption(format!(
                    "ttl '{}' can't be negative",
                    ttl
                )));
            }
        }

        if self.persistent && self.storage_dir.as_os_str().is_empty() {
            return Err(CacheError::InvalidOption(
                "storage_dir can't be empty when persistence is enabled".to_string(),
            ));
        }

        Ok(())
    }
}
