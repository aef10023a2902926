//! Total coercions from the router's generic scalar values.
//!
//! Payloads arrive as dynamically typed JSON values; handlers coerce them
//! into the types they expect. Every coercion here is total: a mismatched
//! shape yields `None` (or a default) instead of failing loudly.

use serde_json::Value;

/// Extended coercion for platform identifiers ("snowflakes").
///
/// Canonical form is a decimal numeric string. Native strings pass
/// through unchanged, integers become their base-10 decimal form, and
/// any other shape is rejected.
pub fn as_snowflake(v: &Value) -> Option<String> {
    if let Some(s) = v.as_str() {
        Some(s.to_owned())
    } else if let Some(i) = v.as_i64() {
        Some(i.to_string())
    } else {
        v.as_u64().map(|u| u.to_string())
    }
}

/// Coerce an optional value to a bool, falling back to `default` when the
/// value is absent or not a native boolean.
pub fn bool_or(v: Option<&Value>, default: bool) -> bool {
    v.and_then(Value::as_bool).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn snowflake_string_passes_through() {
        assert_eq!(as_snowflake(&json!("109462392862000000")), Some("109462392862000000".into()));
    }

    #[test]
    fn snowflake_integer_becomes_decimal_string() {
        assert_eq!(as_snowflake(&json!(109_462_392_862_i64)), Some("109462392862".into()));
        assert_eq!(as_snowflake(&json!(u64::MAX)), Some(u64::MAX.to_string()));
    }

    #[test]
    fn snowflake_rejects_other_shapes() {
        assert_eq!(as_snowflake(&json!(true)), None);
        assert_eq!(as_snowflake(&json!(1.5)), None);
        assert_eq!(as_snowflake(&json!(["1"])), None);
        assert_eq!(as_snowflake(&json!(null)), None);
    }

    #[test]
    fn bool_or_defaults() {
        assert!(bool_or(Some(&json!(true)), false));
        assert!(!bool_or(Some(&json!("yes")), false));
        assert!(bool_or(None, true));
    }
}
