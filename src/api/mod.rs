//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /put` - Store a value, replacing any existing entry
//! - `PUT /set` - Store a value only if the key is absent
//! - `GET /get/:key` - Retrieve a value by key
//! - `GET /has/:key` - Check whether a key is live
//! - `DELETE /del/:key` - Delete a key
//! - `DELETE /clean` - Remove every entry
//! - `GET /keys` - List live keys, oldest first
//! - `GET /stats` - Entry count and size
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
