//! # ConfDB Codec
//!
//! Encoding of everything ConfDB writes to disk.
//!
//! - Records and journal payloads are CBOR, produced from `serde` types
//!   with `ciborium`.
//! - Bucket keys use an order-preserving byte encoding so that iterating a
//!   bucket in byte order visits records in primary-key order.
//!
//! ```
//! use confdb_codec::{from_cbor, to_cbor};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Hook {
//!     id: u64,
//!     name: String,
//! }
//!
//! let hook = Hook { id: 7, name: "deploy".into() };
//! let bytes = to_cbor(&hook).unwrap();
//! assert_eq!(from_cbor::<Hook>(&bytes).unwrap(), hook);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod key;

pub use ciborium::Value;
pub use error::{CodecError, CodecResult};
pub use key::{decode_int_key, decode_str_key, encode_int_key, encode_str_key};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serializes `value` to CBOR bytes.
///
/// # Errors
///
/// Returns [`CodecError::EncodingFailed`] if the value cannot be serialized.
pub fn to_cbor<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buf)
}

/// Deserializes a value from CBOR bytes.
///
/// # Errors
///
/// Returns [`CodecError::DecodingFailed`] if the bytes are not valid CBOR
/// for `T`.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    ciborium::from_reader(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))
}

/// Converts a serializable value into a CBOR [`Value`] tree.
///
/// Used to read individual fields of otherwise opaque records, for
/// example when sorting by a field name.
///
/// # Errors
///
/// Returns [`CodecError::EncodingFailed`] if the value cannot be serialized.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> CodecResult<Value> {
    Value::serialized(value).map_err(|e| CodecError::encoding_failed(e.to_string()))
}

/// Looks up a text-keyed field of a CBOR map.
#[must_use]
pub fn map_field<'a>(value: &'a Value, field: &str) -> Option<&'a Value> {
    value
        .as_map()?
        .iter()
        .find(|(k, _)| k.as_text() == Some(field))
        .map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Matcher {
        id: u64,
        name: String,
        integration_id: u64,
        value: Option<String>,
    }

    #[test]
    fn record_survives_encoding() {
        let matcher = Matcher {
            id: 3,
            name: "branch".into(),
            integration_id: 1,
            value: None,
        };

        let bytes = to_cbor(&matcher).unwrap();
        assert_eq!(from_cbor::<Matcher>(&bytes).unwrap(), matcher);
    }

    #[test]
    fn garbage_fails_to_decode() {
        let result = from_cbor::<Matcher>(&[0xff, 0x00, 0x13]);
        assert!(matches!(result, Err(CodecError::DecodingFailed { .. })));
    }

    #[test]
    fn fields_are_reachable_through_value() {
        let matcher = Matcher {
            id: 9,
            name: "event".into(),
            integration_id: 4,
            value: Some("push".into()),
        };

        let value = to_value(&matcher).unwrap();
        assert_eq!(
            map_field(&value, "name").and_then(Value::as_text),
            Some("event")
        );
        assert!(map_field(&value, "missing").is_none());
    }
}
