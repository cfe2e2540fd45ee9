//! Configuration Module
//!
//! Handles loading server and cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::cache::{CacheOptions, DEFAULT_STORAGE_DIR};
use crate::error::{CacheError, Result};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: Option<f64>,
    /// Size budget in bytes
    pub size_limit: Option<u64>,
    /// Mirror cache contents to disk
    pub persistent: bool,
    /// Directory for persisted records
    pub storage_dir: PathBuf,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_TTL` - Default TTL in seconds (default: none)
    /// - `CACHE_LIMIT` - Size budget in bytes (default: none)
    /// - `CACHE_PERSISTENT` - `true`/`false` (default: false)
    /// - `CACHE_DIR` - Storage directory (default: `.cache`)
    ///
    /// Malformed values fail with `InvalidOption` instead of falling back.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from any variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let server_port = match var("SERVER_PORT") {
            Some(v) => parse_number("SERVER_PORT", &v)?,
            None => defaults.server_port,
        };

        let default_ttl = match var("CACHE_TTL") {
            Some(v) => {
                let ttl: f64 = parse_number("CACHE_TTL", &v)?;
                if !ttl.is_finite() || ttl < 0.0 {
                    return Err(CacheError::InvalidOption(format!(
                        "CACHE_TTL '{}' must be a non-negative number",
                        v
                    )));
                }
                Some(ttl)
            }
            None => defaults.default_ttl,
        };

        let size_limit = match var("CACHE_LIMIT") {
            Some(v) => Some(parse_number("CACHE_LIMIT", &v)?),
            None => defaults.size_limit,
        };

        let persistent = match var("CACHE_PERSISTENT") {
            Some(v) => parse_bool("CACHE_PERSISTENT", &v)?,
            None => defaults.persistent,
        };

        let storage_dir = var("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_dir);

        Ok(Self {
            server_port,
            default_ttl,
            size_limit,
            persistent,
            storage_dir,
        })
    }

    /// Cache options described by this configuration.
    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            default_ttl: self.default_ttl,
            size_limit: self.size_limit,
            persistent: self.persistent,
            storage_dir: self.storage_dir.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            default_ttl: None,
            size_limit: None,
            persistent: false,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
        }
    }
}

fn parse_number<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.parse().map_err(|_| {
        CacheError::InvalidOption(format!("{} '{}' is not a valid number", name, raw))
    })
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(CacheError::InvalidOption(format!(
            "{} '{}' is not a boolean",
            name, raw
        ))),
    }
}
