//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key is empty
    #[error("Invalid key: keys must be non-empty strings")]
    InvalidKey,

    /// Value is one of the absent sentinels
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// TTL is negative or not a finite number
    #[error("Invalid ttl: {0}")]
    InvalidTtl(String),

    /// Malformed construction option
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// Durable storage could not be read or written
    #[error("Persistence I/O failed at {path}: {source}")]
    PersistenceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted record could not be decoded or encoded
    #[error("Corrupt record at {path}: {source}")]
    CorruptRecord {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No tokio runtime available to drive timers and persistence
    #[error("Cache must be created inside a tokio runtime")]
    Runtime,

    /// Key not found (HTTP layer only)
    #[error("Key not found: {0}")]
    NotFound(String),
}

impl CacheError {
    /// Wraps an I/O error together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::PersistenceIo {
            path: path.into(),
            source,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidKey
            | CacheError::InvalidValue(_)
            | CacheError::InvalidTtl(_)
            | CacheError::InvalidOption(_) => StatusCode::BAD_REQUEST,
            CacheError::PersistenceIo { .. }
            | CacheError::CorruptRecord { .. }
            | CacheError::Runtime => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
