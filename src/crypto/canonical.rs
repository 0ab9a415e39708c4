//! Canonical signable form of key objects
//!
//! The signable form is the object minus its `signatures` and `unsigned`
//! fields, encoded as compact JSON with object keys sorted at every depth.
//! Sorting is done explicitly so the output does not depend on how
//! `serde_json::Map` orders its entries.

use super::SigningError;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Fields never covered by a signature.
const UNSIGNED_FIELDS: [&str; 2] = ["signatures", "unsigned"];

/// Canonical JSON of `object`'s signable form.
pub fn canonical_json<T: Serialize>(object: &T) -> Result<String, SigningError> {
    let value = match serde_json::to_value(object)? {
        Value::Object(mut map) => {
            for field in UNSIGNED_FIELDS {
                map.remove(field);
            }
            Value::Object(map)
        }
        other => other,
    };

    Ok(serde_json::to_string(&sorted(value))?)
}

fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let ordered: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sorted(v))).collect();
            Value::Object(ordered.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strips_signatures_and_unsigned() {
        let object = json!({
            "user_id": "@alice:example.org",
            "signatures": { "@alice:example.org": { "ed25519:X": "sig" } },
            "unsigned": { "age": 10 }
        });

        assert_eq!(
            canonical_json(&object).unwrap(),
            r#"{"user_id":"@alice:example.org"}"#
        );
    }

    #[test]
    fn test_sorts_nested_keys() {
        let object = json!({
            "b": { "z": 1, "a": [ { "y": true, "x": null } ] },
            "a": "first"
        });

        assert_eq!(
            canonical_json(&object).unwrap(),
            r#"{"a":"first","b":{"a":[{"x":null,"y":true}],"z":1}}"#
        );
    }

    #[test]
    fn test_nested_signatures_are_kept() {
        // Only top-level `signatures` is excluded from the signable form
        let object = json!({ "inner": { "signatures": "kept" } });
        assert_eq!(
            canonical_json(&object).unwrap(),
            r#"{"inner":{"signatures":"kept"}}"#
        );
    }
}
