//! Decoding of base64-encoded smart-contract return values into the textual
//! representations used throughout the aggregation pipeline: base58 addresses,
//! decimal big-integer strings, u64s, hex byte strings and UTF-8 strings.
//!
//! Pure functions only, no state.

use base64::{prelude::BASE64_STANDARD, Engine};
use num_bigint::BigUint;
use thiserror::Error;

/// Raw length of an account address in bytes.
pub const ADDRESS_LEN: usize = 32;

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("invalid base64 value '{0}'")]
    InvalidBase64(String),

    #[error("invalid base58 address '{0}'")]
    InvalidBase58(String),

    #[error("invalid address length {0}, expected {ADDRESS_LEN}")]
    InvalidAddressLength(usize),

    #[error("integer value of {0} bytes does not fit into u64")]
    ValueOutOfRange(usize),

    #[error("value is not valid utf-8")]
    InvalidUtf8,
}

/// Decodes a base64-encoded return value into its raw bytes.
pub fn decode_bytes(encoded: &str) -> CodecResult<Vec<u8>> {
    BASE64_STANDARD
        .decode(encoded)
        .map_err(|_| CodecError::InvalidBase64(encoded.to_string()))
}

/// Decodes a base64-encoded 32-byte account address into its base58 text
/// form.
pub fn decode_address(encoded: &str) -> CodecResult<String> {
    let bytes = decode_bytes(encoded)?;
    if bytes.len() != ADDRESS_LEN {
        return Err(CodecError::InvalidAddressLength(bytes.len()));
    }
    Ok(bs58::encode(bytes).into_string())
}

/// Re-encodes a base58 address as the lowercase hex string contract queries
/// expect as an argument.
pub fn address_to_hex(address: &str) -> CodecResult<String> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|_| CodecError::InvalidBase58(address.to_string()))?;
    if bytes.len() != ADDRESS_LEN {
        return Err(CodecError::InvalidAddressLength(bytes.len()));
    }
    Ok(hex::encode(bytes))
}

/// Decodes a base64-encoded byte string into lowercase hex, the textual form
/// of BLS public keys.
pub fn decode_hex_key(encoded: &str) -> CodecResult<String> {
    Ok(hex::encode(decode_bytes(encoded)?))
}

/// Decodes a base64-encoded big-endian unsigned integer of arbitrary
/// precision into its decimal string form. An empty value decodes to "0".
pub fn decode_biguint(encoded: &str) -> CodecResult<String> {
    let bytes = decode_bytes(encoded)?;
    Ok(BigUint::from_bytes_be(&bytes).to_string())
}

/// Decodes a base64-encoded big-endian unsigned integer that must fit into
/// a u64 (nonces, queue sizes).
pub fn decode_u64(encoded: &str) -> CodecResult<u64> {
    let bytes = decode_bytes(encoded)?;
    if bytes.len() > 8 {
        return Err(CodecError::ValueOutOfRange(bytes.len()));
    }
    let mut value = 0u64;
    for byte in bytes {
        value = value << 8 | u64::from(byte);
    }
    Ok(value)
}

/// Decodes a base64-encoded UTF-8 string.
pub fn decode_string(encoded: &str) -> CodecResult<String> {
    String::from_utf8(decode_bytes(encoded)?).map_err(|_| CodecError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(bytes: &[u8]) -> String {
        BASE64_STANDARD.encode(bytes)
    }

    #[test]
    fn decodes_address_to_base58() {
        let raw = [7u8; ADDRESS_LEN];
        let address = decode_address(&encode(&raw)).unwrap();
        assert_eq!(
            bs58::decode(&address).into_vec().unwrap(),
            raw.to_vec()
        );
    }

    #[test]
    fn rejects_address_with_wrong_length() {
        assert_eq!(
            decode_address(&encode(&[1u8; 20])),
            Err(CodecError::InvalidAddressLength(20))
        );
    }

    #[test]
    fn address_hex_roundtrip() {
        let raw = [42u8; ADDRESS_LEN];
        let address = decode_address(&encode(&raw)).unwrap();
        assert_eq!(address_to_hex(&address).unwrap(), hex::encode(raw));
    }

    #[test]
    fn decodes_biguint_beyond_u64() {
        // 2^64, one byte longer than a u64
        let bytes = [1u8, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(
            decode_biguint(&encode(&bytes)).unwrap(),
            "18446744073709551616"
        );
        assert_eq!(decode_biguint(&encode(&[])).unwrap(), "0");
    }

    #[test]
    fn decodes_u64_big_endian() {
        assert_eq!(decode_u64(&encode(&[1, 0])).unwrap(), 256);
        assert_eq!(decode_u64(&encode(&[])).unwrap(), 0);
        assert_eq!(
            decode_u64(&encode(&[1u8; 9])),
            Err(CodecError::ValueOutOfRange(9))
        );
    }

    #[test]
    fn decodes_hex_key_lowercase() {
        assert_eq!(decode_hex_key(&encode(&[0xAB, 0xCD])).unwrap(), "abcd");
    }

    #[test]
    fn decodes_utf8_string() {
        assert_eq!(decode_string(&encode(b"staked")).unwrap(), "staked");
        assert!(decode_string(&encode(&[0xff, 0xfe])).is_err());
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(matches!(
            decode_bytes("not-base64!"),
            Err(CodecError::InvalidBase64(_))
        ));
    }
}
