//! Size Estimator Module
//!
//! Structural byte-size heuristic used to enforce the size budget and to
//! report usage. Not an exact memory footprint.

use crate::cache::CacheValue;

/// Estimated bytes of a number.
pub const NUMBER_SIZE: usize = 8;

/// Estimated bytes of a boolean.
pub const BOOLEAN_SIZE: usize = 4;

/// Characters of fixed wrapper text around a symbol name (`Symbol(` + `)`).
const SYMBOL_WRAPPER_LEN: usize = 8;

const SIZE_UNITS: [&str; 5] = ["bytes", "KiB", "MiB", "GiB", "TiB"];

// == Estimate Size ==
/// Returns the approximate byte size of a value.
///
/// Text counts two bytes per UTF-16 code unit. Mappings count their values
/// only, never their keys. Absent sentinels and opaque values weigh nothing.
pub fn estimate_size(value: &CacheValue) -> usize {
    match value {
        CacheValue::Number(_) => NUMBER_SIZE,
        CacheValue::Boolean(_) => BOOLEAN_SIZE,
        CacheValue::Text(text) => text.encode_utf16().count() * 2,
        CacheValue::Bytes(bytes) => bytes.len(),
        CacheValue::Symbol(symbol) => {
            if symbol.global {
                symbol.name.encode_utf16().count() * 2
            } else {
                // Approximation: display text minus the wrapper.
                symbol
                    .display_text()
                    .encode_utf16()
                    .count()
                    .saturating_sub(SYMBOL_WRAPPER_LEN)
                    * 2
            }
        }
        CacheValue::Sequence(items) => items.iter().map(estimate_size).sum(),
        CacheValue::Mapping(map) => map.values().map(estimate_size).sum(),
        CacheValue::Null | CacheValue::Undefined | CacheValue::Opaque(_) => 0,
    }
}

// == Format Size ==
/// Renders a byte count as human-readable text.
///
/// The unit is `floor(log1024(bytes))`; plain bytes render without a
/// fraction, larger units with one fractional digit. Counts beyond the unit
/// table fall back to plain bytes.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return format!("0 {}", SIZE_UNITS[0]);
    }

    let mut index = 0usize;
    let mut scale = 1u128;
    while u128::from(bytes) >= scale * 1024 {
        scale *= 1024;
        index += 1;
    }

    match SIZE_UNITS.get(index) {
        Some(unit) if index > 0 => format!("{:.1} {}", bytes as f64 / scale as f64, unit),
        _ => format!("{} {}", bytes, SIZE_UNITS[0]),
    }
}
