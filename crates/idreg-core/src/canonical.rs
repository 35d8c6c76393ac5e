//! # Canonical Serialization
//!
//! `CanonicalBytes` is the only input accepted by [`crate::sha256_digest`].
//! Values are serialized to a JSON tree, floats are rejected, and the tree is
//! written with sorted object keys and compact separators, so the same value
//! always produces the same bytes.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced by canonical JSON serialization.
///
/// The inner buffer is private; [`CanonicalBytes::new`] is the only
/// constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// `FloatRejected` if the value contains a non-integer number,
    /// `SerializationFailed` if serde cannot represent it as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        reject_floats(&value)?;
        // serde_json's default `Map` is a BTreeMap: keys come out sorted.
        Ok(Self(serde_json::to_vec(&value)?))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn reject_floats(value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Number(n) if n.is_f64() => {
            Err(CanonicalizationError::FloatRejected(n.as_f64().unwrap_or(f64::NAN)))
        }
        Value::Array(items) => items.iter().try_for_each(reject_floats),
        Value::Object(map) => map.values().try_for_each(reject_floats),
        _ => Ok(()),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    proptest! {
        /// Canonicalization of string maps is deterministic and valid JSON.
        #[test]
        fn string_maps_canonicalize_deterministically(
            fields in prop::collection::btree_map("[a-z_]{1,12}", "[a-zA-Z0-9@./ ]{0,24}", 0..8)
        ) {
            let fields: BTreeMap<String, String> = fields;
            let a = CanonicalBytes::new(&fields).unwrap();
            let b = CanonicalBytes::new(&fields).unwrap();
            prop_assert_eq!(a.as_bytes(), b.as_bytes());
            let parsed: BTreeMap<String, String> = serde_json::from_slice(a.as_bytes()).unwrap();
            prop_assert_eq!(parsed, fields);
        }
    }
}
