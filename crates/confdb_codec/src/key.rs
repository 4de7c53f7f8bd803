//! Order-preserving key encoding.
//!
//! Integer keys are stored big-endian so that byte order matches numeric
//! order. String keys are stored as their UTF-8 bytes.

use crate::error::{CodecError, CodecResult};

/// Encodes an integer primary key.
#[must_use]
pub fn encode_int_key(id: u64) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

/// Decodes an integer primary key.
///
/// # Errors
///
/// Returns [`CodecError::InvalidKey`] unless `bytes` is exactly 8 bytes long.
pub fn decode_int_key(bytes: &[u8]) -> CodecResult<u64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| CodecError::invalid_key(format!("expected 8 bytes, got {}", bytes.len())))?;
    Ok(u64::from_be_bytes(raw))
}

/// Encodes a natural (string) primary key.
#[must_use]
pub fn encode_str_key(key: &str) -> Vec<u8> {
    key.as_bytes().to_vec()
}

/// Decodes a natural (string) primary key.
///
/// # Errors
///
/// Returns [`CodecError::InvalidKey`] if the bytes are not UTF-8.
pub fn decode_str_key(bytes: &[u8]) -> CodecResult<String> {
    String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::invalid_key("key is not UTF-8"))
}
