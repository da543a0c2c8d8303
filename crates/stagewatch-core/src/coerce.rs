//! Lenient field decoders for upstream rows.
//!
//! The workflow API is loose about types: ids arrive as numbers or strings,
//! percentages as `"45.5"`, flags as `"Y"`/`"n"`. Every decoder here has an
//! explicit fallback so a single odd cell never voids a row.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// String or number into a trimmed, non-empty string.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    Ok(value_to_string(&val))
}

/// String or number into a string, empty when absent or unusable.
pub fn string_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    Ok(value_to_string(&val).unwrap_or_default())
}

pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    Ok(value_to_i64(&val))
}

pub fn i64_or_default<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    Ok(value_to_i64(&val).unwrap_or(0))
}

/// Percent complete clamped to `0..=100`; NaN and garbage become 0.
pub fn percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    Ok(value_to_percent(&val))
}

/// Single-character flag codes (`Y`/`y`/`N`/`n`), plus booleans and 0/1.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let val = Value::deserialize(deserializer)?;
    Ok(value_to_flag(&val))
}

/// Array whose null or malformed elements are dropped instead of failing the
/// whole document.
pub fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let val = Value::deserialize(deserializer)?;
    let Value::Array(items) = val else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter(|item| item.is_object())
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

pub fn value_to_string(val: &Value) -> Option<String> {
    let text = match val {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub fn value_to_i64(val: &Value) -> Option<i64> {
    match val {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<i64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

pub fn value_to_percent(val: &Value) -> u8 {
    let raw = match val {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(f) if f.is_finite() => f.clamp(0.0, 100.0).round() as u8,
        _ => 0,
    }
}

pub fn value_to_flag(val: &Value) -> bool {
    match val {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64() == Some(1),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "y" | "yes" | "true" | "1"
        ),
        _ => false,
    }
}
