//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::Cache;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    CleanResponse, DeleteResponse, GetResponse, HasResponse, HealthResponse, KeysResponse,
    StatsResponse, WriteRequest, WriteResponse,
};

/// Application state shared across all handlers.
///
/// `Cache` is a cheap clonable handle; the store lock lives inside it.
#[derive(Clone, Debug)]
pub struct AppState {
    pub cache: Cache,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: Cache) -> Self {
        Self { cache }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Must be called inside a tokio runtime.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = Cache::new(config.cache_options())?;
        Ok(Self::new(cache))
    }
}

/// Handler for PUT /put
///
/// Stores a value, replacing any existing entry under the key.
pub async fn put_handler(
    State(state): State<AppState>,
    Json(req): Json<WriteRequest>,
) -> Result<Json<WriteResponse>> {
    state.cache.put(&req.key, req.cache_value(), req.ttl)?;
    let stored = state.cache.has(&req.key)?;

    Ok(Json(WriteResponse::new(req.key, stored)))
}

/// Handler for PUT /set
///
/// Stores a value only when the key has no live entry.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<WriteRequest>,
) -> Result<Json<WriteResponse>> {
    state.cache.set(&req.key, req.cache_value(), req.ttl)?;
    let stored = state.cache.has(&req.key)?;

    Ok(Json(WriteResponse::new(req.key, stored)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state
        .cache
        .get(&key)?
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value.to_json())))
}

/// Handler for GET /has/:key
pub async fn has_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<HasResponse>> {
    let exists = state.cache.has(&key)?;

    Ok(Json(HasResponse { key, exists }))
}

/// Handler for DELETE /del/:key
///
/// Deleting an absent key is not an error.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.cache.delete(&key)?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for DELETE /clean
pub async fn clean_handler(State(state): State<AppState>) -> Json<CleanResponse> {
    let removed = state.cache.count();
    state.cache.clean();

    Json(CleanResponse { removed })
}

/// Handler for GET /keys
pub async fn keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    Json(KeysResponse {
        keys: state.cache.keys(),
    })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = &state.cache;

    Json(StatsResponse {
        count: cache.count(),
        size: cache.size(),
        size_text: cache.size_text(),
        ready: cache.is_ready(),
    })
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
