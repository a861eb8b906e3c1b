//! # Canonical Serialization
//!
//! `CanonicalBytes` is the only input accepted by digest computation. Schemas
//! and configurations that are semantically equal must hash equal, so the
//! bytes are produced by one fixed pipeline:
//!
//! 1. Serialize to a JSON value.
//! 2. Normalize numbers: a float with no fractional part inside the exactly
//!    representable range becomes an integer, so `1.0` and `1` agree.
//! 3. Serialize with `serde_jcs` (RFC 8785): sorted keys, compact separators.
//!
//! Unlike a monetary ledger, schemas legitimately carry fractional numbers
//! (`multipleOf: 0.01`), so floats pass through.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by [`CanonicalBytes::new`].
///
/// The inner buffer is private; every digest in the workspace is computed
/// from a value of this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::SerializationFailed` if the value cannot
    /// be represented as JSON (for example a map with non-string keys).
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        let normalized = normalize_numbers(value);
        let text = serde_jcs::to_string(&normalized)?;
        Ok(Self(text.into_bytes()))
    }

    /// The canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn normalize_numbers(value: Value) -> Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_992.0;
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < MAX_SAFE => Value::from(f as i64),
            _ => Value::Number(n),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, normalize_numbers(v)))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(cb: &CanonicalBytes) -> &str {
        std::str::from_utf8(cb.as_bytes()).unwrap()
    }

    #[test]
    fn test_keys_are_sorted_and_compact() {
        let cb = CanonicalBytes::new(&json!({"type": "object", "required": ["b", "a"]})).unwrap();
        assert_eq!(text(&cb), r#"{"required":["b","a"],"type":"object"}"#);
    }

    #[test]
    fn test_nested_objects_are_sorted() {
        let cb = CanonicalBytes::new(&json!({"properties": {"z": {}, "a": {"type": "string"}}}))
            .unwrap();
        assert_eq!(text(&cb), r#"{"properties":{"a":{"type":"string"},"z":{}}}"#);
    }

    #[test]
    fn test_integral_floats_match_integers() {
        let a = CanonicalBytes::new(&json!({"minimum": 1.0})).unwrap();
        let b = CanonicalBytes::new(&json!({"minimum": 1})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fractional_numbers_pass_through() {
        let cb = CanonicalBytes::new(&json!({"multipleOf": 0.5})).unwrap();
        assert_eq!(text(&cb), r#"{"multipleOf":0.5}"#);
    }

    #[test]
    fn test_null_and_bool_pass_through() {
        let cb = CanonicalBytes::new(&json!({"const": null, "uniqueItems": true})).unwrap();
        assert_eq!(text(&cb), r#"{"const":null,"uniqueItems":true}"#);
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(CanonicalBytes::new(&json!({})).unwrap().as_bytes(), b"{}");
        assert_eq!(CanonicalBytes::new(&json!([])).unwrap().as_bytes(), b"[]");
    }

    #[test]
    fn test_non_string_keys_are_rejected() {
        let mut map = std::collections::HashMap::new();
        map.insert(vec![1u8], 1);
        assert!(matches!(
            CanonicalBytes::new(&map),
            Err(CanonicalizationError::SerializationFailed(_))
        ));
    }

    #[test]
    fn test_unicode_is_not_escaped() {
        let cb = CanonicalBytes::new(&json!({"title": "\u{00e9}t\u{00e9}"})).unwrap();
        assert!(text(&cb).contains('\u{00e9}'));
        assert!(!cb.is_empty());
    }
}
