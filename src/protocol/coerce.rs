//!
//! Primitive coercion helpers for untyped upstream payloads.
//!
//! Every function here is total: unparseable input degrades to an empty string or
//! `None`, never to a panic or an error. This is what keeps the normalizer and the
//! sanitizer exception-free when fed arbitrary third-party JSON.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use serde_json::{Map, Number, Value};

/* --- constants ------------------------------------------------------------------------------ */

/** Largest magnitude at which an integral float is still printed without a fraction */
const MAX_INTEGRAL_DISPLAY: f64 = 1e21;

/* --- start of code -------------------------------------------------------------------------- */

///
/// Coerce any JSON value into a trimmed string.
///
/// Strings pass through trimmed, numbers and booleans are stringified, arrays are
/// flattened element by element and joined with a single space, and objects yield
/// their `text` field, then their `content` field, then their JSON serialization.
/// `null` yields the empty string.
///
/// # Arguments
///  * `value` - arbitrary JSON value
///
/// # Returns
///  * Extracted text, possibly empty
pub fn coerce_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::Array(items) => items
            .iter()
            .map(coerce_array_item)
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string(),
        Value::Object(map) => carrier_text(map).unwrap_or_else(|| safe_stringify(value)),
    }
}

///
/// Coerce an optional field value, treating an absent field like `null`.
pub fn coerce_field(map: &Map<String, Value>, key: &str) -> String {
    map.get(key).map(coerce_string).unwrap_or_default()
}

///
/// Coerce a JSON value into a finite number.
///
/// Accepts finite numbers and strings that parse to a finite number.
///
/// # Returns
///  * `Some(f64)` for numeric input, `None` otherwise (never NaN or infinite)
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

///
/// Coerce a JSON value into a boolean.
///
/// Accepts booleans and the strings `"true"` / `"false"` (case-insensitive, trimmed).
pub fn coerce_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

///
/// Serialize a JSON value, returning an empty string if serialization fails.
pub fn safe_stringify(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

///
/// Extract the first non-empty textual carrier of an object: `text`, then `content`.
pub(crate) fn carrier_text(map: &Map<String, Value>) -> Option<String> {
    ["text", "content"]
        .iter()
        .map(|key| coerce_field(map, key))
        .find(|text| !text.is_empty())
}

/// Array elements keep their inner whitespace; only the joined result is trimmed.
fn coerce_array_item(item: &Value) -> String {
    match item {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(map) => carrier_text(map).unwrap_or_else(|| safe_stringify(item)),
        other => safe_stringify(other),
    }
}

/// Integral floats print without a trailing `.0`.
fn format_number(n: &Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() < MAX_INTEGRAL_DISPLAY {
                return format!("{}", f as i128);
            }
        }
    }
    n.to_string()
}

/* --- tests ------------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_string_scalars() {
        assert_eq!(coerce_string(&json!("  hello  ")), "hello");
        assert_eq!(coerce_string(&json!(42)), "42");
        assert_eq!(coerce_string(&json!(2.0)), "2");
        assert_eq!(coerce_string(&json!(2.5)), "2.5");
        assert_eq!(coerce_string(&json!(true)), "true");
        assert_eq!(coerce_string(&Value::Null), "");
    }

    #[test]
    fn test_coerce_string_object_prefers_text_then_content() {
        assert_eq!(coerce_string(&json!({"text": "a", "content": "b"})), "a");
        assert_eq!(coerce_string(&json!({"text": "   ", "content": "b"})), "b");
        assert_eq!(coerce_string(&json!({"other": 1})), r#"{"other":1}"#);
    }

    #[test]
    fn test_coerce_string_array_joins_non_empty_items() {
        let value = json!(["first", {"text": "second"}, {"content": "third"}, "", null, 7]);
        assert_eq!(coerce_string(&value), "first second third 7");
    }

    #[test]
    fn test_coerce_string_array_serializes_opaque_objects() {
        let value = json!([{"type": "image", "source": {"url": "x"}}]);
        assert_eq!(coerce_string(&value), r#"{"type":"image","source":{"url":"x"}}"#);
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(&json!(12)), Some(12.0));
        assert_eq!(coerce_number(&json!(" 0.5 ")), Some(0.5));
        assert_eq!(coerce_number(&json!("1e3")), Some(1000.0));
        assert_eq!(coerce_number(&json!("")), None);
        assert_eq!(coerce_number(&json!("abc")), None);
        assert_eq!(coerce_number(&json!("inf")), None);
        assert_eq!(coerce_number(&json!(true)), None);
        assert_eq!(coerce_number(&Value::Null), None);
    }

    #[test]
    fn test_coerce_boolean() {
        assert_eq!(coerce_boolean(&json!(true)), Some(true));
        assert_eq!(coerce_boolean(&json!(" TRUE ")), Some(true));
        assert_eq!(coerce_boolean(&json!("False")), Some(false));
        assert_eq!(coerce_boolean(&json!("yes")), None);
        assert_eq!(coerce_boolean(&json!(1)), None);
    }
}
