//! Persisted key layout.
//!
//! | Purpose          | Key                                  | Value                     |
//! |------------------|--------------------------------------|---------------------------|
//! | counter          | `idmap/ctr`                          | u64, big endian           |
//! | forward id map   | `idmap/u/<identifier>`               | u64, big endian           |
//! | reverse id map   | `idmap/i/<u64 big endian>`           | identifier bytes          |
//! | primary record   | `<kind>_id:<identifier>`             | JSON record snapshot      |
//! | posting list     | `<field>:<value-or-bucket>`          | roaring treemap bytes     |

use crate::error::{Result, TokenDbError};

pub const COUNTER_KEY: &[u8] = b"idmap/ctr";
pub const FORWARD_PREFIX: &[u8] = b"idmap/u/";
pub const REVERSE_PREFIX: &[u8] = b"idmap/i/";
const IDMAP_PREFIX: &[u8] = b"idmap/";

pub fn forward_key(identifier: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(FORWARD_PREFIX.len() + identifier.len());
    key.extend_from_slice(FORWARD_PREFIX);
    key.extend_from_slice(identifier.as_bytes());
    key
}

pub fn reverse_key(dense_id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(REVERSE_PREFIX.len() + 8);
    key.extend_from_slice(REVERSE_PREFIX);
    key.extend_from_slice(&dense_id.to_be_bytes());
    key
}

pub fn primary_prefix(kind: &str) -> Vec<u8> {
    format!("{}_id:", kind).into_bytes()
}

pub fn primary_key(kind: &str, identifier: &str) -> Vec<u8> {
    let mut key = primary_prefix(kind);
    key.extend_from_slice(identifier.as_bytes());
    key
}

pub fn encode_u64(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Decode an 8-byte big-endian integer; any other length is corruption.
pub fn decode_u64(key: &[u8], bytes: &[u8]) -> Result<u64> {
    let buf: [u8; 8] = bytes.try_into().map_err(|_| {
        TokenDbError::corrupt(key, format!("expected 8 bytes, found {}", bytes.len()))
    })?;
    Ok(u64::from_be_bytes(buf))
}

/// What a raw key in a kind's keyspace stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyClass {
    Counter,
    Forward(String),
    Reverse(u64),
    Primary(String),
    Posting,
    /// Under `idmap/` but matching no known shape
    Unknown,
}

pub fn classify(kind: &str, key: &[u8]) -> KeyClass {
    if key == COUNTER_KEY {
        return KeyClass::Counter;
    }
    if let Some(rest) = key.strip_prefix(FORWARD_PREFIX) {
        return KeyClass::Forward(String::from_utf8_lossy(rest).into_owned());
    }
    if let Some(rest) = key.strip_prefix(REVERSE_PREFIX) {
        return match <[u8; 8]>::try_from(rest) {
            Ok(buf) => KeyClass::Reverse(u64::from_be_bytes(buf)),
            Err(_) => KeyClass::Unknown,
        };
    }
    if key.starts_with(IDMAP_PREFIX) {
        return KeyClass::Unknown;
    }
    if let Some(rest) = key.strip_prefix(primary_prefix(kind).as_slice()) {
        return KeyClass::Primary(String::from_utf8_lossy(rest).into_owned());
    }
    KeyClass::Posting
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shapes() {
        assert_eq!(forward_key("01ABC"), b"idmap/u/01ABC".to_vec());
        let mut expected = b"idmap/i/".to_vec();
        expected.extend_from_slice(&[0, 0, 0, 0, 0, 0, 1, 2]);
        assert_eq!(reverse_key(258), expected);
        assert_eq!(primary_key("trip", "01ABC"), b"trip_id:01ABC".to_vec());
    }

    #[test]
    fn test_reverse_keys_sort_numerically() {
        assert!(reverse_key(255) < reverse_key(256));
        assert!(reverse_key(1) < reverse_key(u64::MAX));
    }

    #[test]
    fn test_decode_u64() {
        assert_eq!(decode_u64(COUNTER_KEY, &encode_u64(42)).unwrap(), 42);
        let err = decode_u64(COUNTER_KEY, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, TokenDbError::Corrupt { .. }));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("trip", COUNTER_KEY), KeyClass::Counter);
        assert_eq!(
            classify("trip", &forward_key("A")),
            KeyClass::Forward("A".to_string())
        );
        assert_eq!(classify("trip", &reverse_key(7)), KeyClass::Reverse(7));
        assert_eq!(
            classify("trip", &primary_key("trip", "A")),
            KeyClass::Primary("A".to_string())
        );
        assert_eq!(classify("trip", b"status:draft"), KeyClass::Posting);
        assert_eq!(classify("trip", b"idmap/i/short"), KeyClass::Unknown);
    }
}
