//! # Plural Normalization
//!
//! W3C data models allow many properties to hold either a single value or an
//! array of values. The typed model always uses arrays, so documents are
//! normalized before structural decoding and collapsed again before
//! serialization.
//!
//! Only the configured top-level keys of one JSON object are touched. Nested
//! objects (services, verification methods, embedded credentials) are
//! normalized separately against their own key sets.

use serde_json::{Map, Value};

use crate::Result;

/// Plural keys of a DID document.
pub const DOCUMENT_PLURALS: &[&str] = &["@context", "controller"];

/// Plural keys of a verifiable credential.
pub const CREDENTIAL_PLURALS: &[&str] =
    &["@context", "type", "credentialSubject", "credentialStatus", "proof"];

/// Plural keys of a verifiable presentation.
pub const PRESENTATION_PLURALS: &[&str] = &["@context", "type", "verifiableCredential", "proof"];

/// Wrap every configured key holding a non-array value in a one-element
/// array. Absent and `null` values are left alone.
pub fn normalize(object: &mut Map<String, Value>, keys: &[&str]) {
    for key in keys {
        if let Some(value) = object.get_mut(*key) {
            if !value.is_array() && !value.is_null() {
                *value = Value::Array(vec![value.take()]);
            }
        }
    }
}

/// Replace every configured key holding a one-element array with that
/// element. Longer and empty arrays are left alone.
pub fn collapse(object: &mut Map<String, Value>, keys: &[&str]) {
    for key in keys {
        if let Some(Value::Array(items)) = object.get_mut(*key) {
            if items.len() == 1 {
                let item = items.remove(0);
                object.insert((*key).to_string(), item);
            }
        }
    }
}

/// Normalize a raw JSON object, returning the re-encoded document.
///
/// # Errors
///
/// Returns an error if `raw` is not a JSON object.
pub fn normalize_document(raw: &[u8], keys: &[&str]) -> Result<Vec<u8>> {
    let mut object: Map<String, Value> = serde_json::from_slice(raw)?;
    normalize(&mut object, keys);
    Ok(serde_json::to_vec(&object)?)
}

/// Collapse a raw JSON object, returning the re-encoded document.
///
/// # Errors
///
/// Returns an error if `raw` is not a JSON object.
pub fn collapse_document(raw: &[u8], keys: &[&str]) -> Result<Vec<u8>> {
    let mut object: Map<String, Value> = serde_json::from_slice(raw)?;
    collapse(&mut object, keys);
    Ok(serde_json::to_vec(&object)?)
}

/// Parse a JSON object and normalize it in one step.
pub(crate) fn normalized_object(raw: &str, keys: &[&str]) -> Result<Map<String, Value>> {
    let mut object: Map<String, Value> = serde_json::from_str(raw)?;
    normalize(&mut object, keys);
    Ok(object)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        let Value::Object(map) = value else { panic!("expected object") };
        map
    }

    #[test]
    fn wraps_single_values() {
        let mut doc = object(json!({
            "@context": "https://www.w3.org/ns/did/v1",
            "controller": ["did:example:1", "did:example:2"],
            "name": "untouched"
        }));
        normalize(&mut doc, DOCUMENT_PLURALS);

        assert_eq!(
            Value::Object(doc),
            json!({
                "@context": ["https://www.w3.org/ns/did/v1"],
                "controller": ["did:example:1", "did:example:2"],
                "name": "untouched"
            })
        );
    }

    #[test]
    fn absent_and_null_untouched() {
        let mut doc = object(json!({"controller": null}));
        normalize(&mut doc, DOCUMENT_PLURALS);
        assert_eq!(Value::Object(doc), json!({"controller": null}));
    }

    #[test]
    fn not_recursive() {
        let mut doc = object(json!({"proof": {"type": "Ed25519Signature2020"}}));
        normalize(&mut doc, CREDENTIAL_PLURALS);
        assert_eq!(Value::Object(doc), json!({"proof": [{"type": "Ed25519Signature2020"}]}));
    }

    #[test]
    fn collapses_single_element_arrays() {
        let mut doc = object(json!({
            "type": ["VerifiableCredential"],
            "credentialSubject": [{"name": "test"}],
            "proof": [],
            "@context": ["a", "b"]
        }));
        collapse(&mut doc, CREDENTIAL_PLURALS);

        assert_eq!(
            Value::Object(doc),
            json!({
                "type": "VerifiableCredential",
                "credentialSubject": {"name": "test"},
                "proof": [],
                "@context": ["a", "b"]
            })
        );
    }

    #[test]
    fn document_bytes() {
        let raw = br#"{"controller":"did:example:1"}"#;
        let normalized = normalize_document(raw, DOCUMENT_PLURALS).unwrap();
        assert_eq!(normalized, br#"{"controller":["did:example:1"]}"#);

        let collapsed = collapse_document(&normalized, DOCUMENT_PLURALS).unwrap();
        assert_eq!(collapsed, raw);

        assert!(normalize_document(b"[1, 2]", DOCUMENT_PLURALS).is_err());
    }
}
