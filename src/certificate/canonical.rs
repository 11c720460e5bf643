//! Canonicalization contract shared by the Builder and the Verifier:
//! UTF-8, sorted keys, compact separators, no insignificant whitespace.
//! `serde_json` with `preserve_order` preserves insertion order, so the
//! builder inserts certificate fields already sorted and the verifier
//! re-sorts on load before re-serializing — both paths converge on the
//! same bytes.

use serde_json::{Map, Value};

/// Fields excluded from the signed byte range: the signature itself and
/// any future external-anchor field.
const EXCLUDED_FIELDS: &[&str] = &["signature", "anchor"];

/// Produce the canonical signable bytes for a certificate value: sorted
/// keys (recursively), compact separators, `signature`/`anchor` removed
/// from the top level.
pub fn canonical_bytes(certificate: &Value) -> Vec<u8> {
    let mut value = certificate.clone();
    if let Value::Object(map) = &mut value {
        for field in EXCLUDED_FIELDS {
            map.remove(*field);
        }
    }
    let sorted = sort_keys(&value);
    serde_json::to_vec(&sorted).expect("canonical JSON serialization cannot fail for a Value")
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted = Map::new();
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                sorted.insert(key.clone(), sort_keys(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sorts_keys_and_drops_signature_and_anchor() {
        let cert = json!({
            "b": 1,
            "a": 2,
            "signature": "deadbeef",
            "anchor": "timestamp-token",
            "nested": {"z": 1, "y": 2}
        });
        let bytes = canonical_bytes(&cert);
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, r#"{"a":2,"b":1,"nested":{"y":2,"z":1}}"#);
    }

    #[test]
    fn deterministic_across_calls() {
        let cert = json!({"b": 1, "a": 2});
        assert_eq!(canonical_bytes(&cert), canonical_bytes(&cert));
    }
}
