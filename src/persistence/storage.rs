//! File Storage
//!
//! Durable key/record mirror: one JSON file per key, named by the SHA-256
//! digest of the key. No locking; one storage instance per directory.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, trace};

use crate::error::{CacheError, Result};
use crate::persistence::PersistedRecord;

// == Storage ==
/// Reads and writes persisted records under a directory.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(hash_key(key))
    }

    // == Save ==
    /// Writes `record`, creating the directory if needed. Overwrites.
    pub async fn save(&self, record: &PersistedRecord) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CacheError::io(&self.dir, e))?;

        let path = self.path_for(&record.key);
        let body = serde_json::to_vec(record).map_err(|e| CacheError::CorruptRecord {
            path: path.clone(),
            source: e,
        })?;

        fs::write(&path, body)
            .await
            .map_err(|e| CacheError::io(&path, e))?;

        trace!("Saved record for '{}' to {}", record.key, path.display());
        Ok(())
    }

    // == Get ==
    /// Reads the record for `key`; a missing file yields `None`.
    pub async fn get(&self, key: &str) -> Result<Option<PersistedRecord>> {
        read_record(&self.path_for(key)).await
    }

    // == Delete ==
    /// Removes the record for `key`; a missing file is not an error.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => {
                trace!("Deleted record for '{}'", key);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(&path, e)),
        }
    }

    // == All ==
    /// Returns every stored record keyed by its cache key.
    pub async fn all(&self) -> Result<HashMap<String, PersistedRecord>> {
        Ok(self
            .entries_by_age()
            .await?
            .into_iter()
            .map(|record| (record.key.clone(), record))
            .collect())
    }

    /// Returns every stored record, least recently written first.
    ///
    /// A missing directory is an empty store. Any unreadable or corrupt
    /// record fails the whole call.
    pub async fn entries_by_age(&self) -> Result<Vec<PersistedRecord>> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Storage directory {} does not exist yet", self.dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(CacheError::io(&self.dir, e)),
        };

        let mut found: Vec<(SystemTime, PersistedRecord)> = Vec::new();
        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| CacheError::io(&self.dir, e))?
        {
            let path = item.path();
            let metadata = item
                .metadata()
                .await
                .map_err(|e| CacheError::io(&path, e))?;
            if !metadata.is_file() {
                continue;
            }

            // A file removed between listing and reading is skipped.
            if let Some(record) = read_record(&path).await? {
                let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                found.push((modified, record));
            }
        }

        found.sort_by(|(a_time, a), (b_time, b)| {
            a_time.cmp(b_time).then_with(|| a.key.cmp(&b.key))
        });
        Ok(found.into_iter().map(|(_, record)| record).collect())
    }
}

// == Helpers ==
/// Stable file name for a key: lowercase hex SHA-256.
pub fn hash_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

async fn read_record(path: &Path) -> Result<Option<PersistedRecord>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CacheError::io(path, e)),
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| CacheError::CorruptRecord {
            path: path.to_path_buf(),
            source: e,
        })
}
