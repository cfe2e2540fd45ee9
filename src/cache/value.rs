//! Cache Value Module
//!
//! Closed set of payload shapes the cache can hold.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// == Symbol Value ==
/// A unique-symbol-like value, identified by its name.
///
/// `global` marks symbols taken from a shared registry; their size is based
/// on the registered name alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolValue {
    pub name: String,
    pub global: bool,
}

impl SymbolValue {
    /// Text shown when the symbol is displayed, e.g. `Symbol(foo)`.
    pub fn display_text(&self) -> String {
        format!("Symbol({})", self.name)
    }
}

// == Cache Value ==
/// A value stored in the cache.
///
/// `Null` and `Undefined` are the two absent sentinels: they may appear
/// nested inside sequences and mappings, but `put`/`set` reject them at the
/// top level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum CacheValue {
    Null,
    Undefined,
    Number(f64),
    Boolean(bool),
    Text(String),
    Bytes(Vec<u8>),
    Symbol(SymbolValue),
    Sequence(Vec<CacheValue>),
    Mapping(BTreeMap<String, CacheValue>),
    /// Any host value the estimator knows nothing about, labelled by kind
    Opaque(String),
}

impl CacheValue {
    /// Creates a local (unregistered) symbol.
    pub fn symbol(name: impl Into<String>) -> Self {
        CacheValue::Symbol(SymbolValue {
            name: name.into(),
            global: false,
        })
    }

    /// Creates a globally registered symbol.
    pub fn global_symbol(name: impl Into<String>) -> Self {
        CacheValue::Symbol(SymbolValue {
            name: name.into(),
            global: true,
        })
    }

    /// Returns true for the two absent sentinels.
    pub fn is_absent(&self) -> bool {
        matches!(self, CacheValue::Null | CacheValue::Undefined)
    }

    // == JSON Conversion ==
    /// Renders the value as plain JSON for API responses.
    ///
    /// Bytes become an array of numbers, symbols their display text, and
    /// sentinels or opaque values `null`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            CacheValue::Null | CacheValue::Undefined | CacheValue::Opaque(_) => JsonValue::Null,
            CacheValue::Number(n) => number_to_json(*n),
            CacheValue::Boolean(b) => JsonValue::Bool(*b),
            CacheValue::Text(s) => JsonValue::String(s.clone()),
            CacheValue::Bytes(bytes) => {
                JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect())
            }
            CacheValue::Symbol(symbol) => JsonValue::String(symbol.display_text()),
            CacheValue::Sequence(items) => {
                JsonValue::Array(items.iter().map(CacheValue::to_json).collect())
            }
            CacheValue::Mapping(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Integral numbers render without a fraction, as `1` rather than `1.0`.
fn number_to_json(n: f64) -> JsonValue {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        return JsonValue::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

impl From<JsonValue> for CacheValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => CacheValue::Null,
            JsonValue::Bool(b) => CacheValue::Boolean(b),
            JsonValue::Number(n) => CacheValue::Number(n.as_f64().unwrap_or_default()),
            JsonValue::String(s) => CacheValue::Text(s),
            JsonValue::Array(items) => {
                CacheValue::Sequence(items.into_iter().map(CacheValue::from).collect())
            }
            JsonValue::Object(map) => CacheValue::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, CacheValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        CacheValue::Text(value.to_string())
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        CacheValue::Text(value)
    }
}

impl From<bool> for CacheValue {
    fn from(value: bool) -> Self {
        CacheValue::Boolean(value)
    }
}

impl From<f64> for CacheValue {
    fn from(value: f64) -> Self {
        CacheValue::Number(value)
    }
}

impl From<i64> for CacheValue {
    fn from(value: i64) -> Self {
        CacheValue::Number(value as f64)
    }
}

impl From<i32> for CacheValue {
    fn from(value: i32) -> Self {
        CacheValue::Number(f64::from(value))
    }
}

impl From<Vec<u8>> for CacheValue {
    fn from(value: Vec<u8>) -> Self {
        CacheValue::Bytes(value)
    }
}

impl From<Vec<CacheValue>> for CacheValue {
    fn from(value: Vec<CacheValue>) -> Self {
        CacheValue::Sequence(value)
    }
}

impl From<BTreeMap<String, CacheValue>> for CacheValue {
    fn from(value: BTreeMap<String, CacheValue>) -> Self {
        CacheValue::Mapping(value)
    }
}
