//! Loose coercions from stored JSON values.
//!
//! Each function returns `None` when the value cannot be used, leaving the
//! caller to substitute the default.

use serde_json::Value as JsonValue;

/// Whole days from a number or numeric string. Negative, non-finite, and
/// non-numeric inputs are unusable. Fractions are floored.
pub(super) fn coerce_days(value: &JsonValue) -> Option<u32> {
    let number = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    if !number.is_finite() || number < 0.0 {
        return None;
    }
    Some(number.floor().min(f64::from(u32::MAX)) as u32)
}

/// Truthiness: `false`, `0`, `NaN` and `""` are false, everything else true.
pub(super) fn coerce_bool(value: &JsonValue) -> Option<bool> {
    match value {
        JsonValue::Null => None,
        JsonValue::Bool(b) => Some(*b),
        JsonValue::Number(n) => Some(n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan())),
        JsonValue::String(s) => Some(!s.is_empty()),
        JsonValue::Array(_) | JsonValue::Object(_) => Some(true),
    }
}

/// Strings pass through; numbers and booleans are stringified.
pub(super) fn coerce_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_days_clamped_to_u32() {
        assert_eq!(coerce_days(&json!(1e20)), Some(u32::MAX));
    }

    #[test]
    fn test_negative_zero_is_zero() {
        assert_eq!(coerce_days(&json!("-0")), Some(0));
    }

    #[test]
    fn test_string_of_null() {
        assert_eq!(coerce_string(&json!(null)), None);
    }
}
