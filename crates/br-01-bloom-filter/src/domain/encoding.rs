//! Text-safe persisted form of a Bloom filter
//!
//! The bit array is packed 8 bits per byte (bit `i` lives in byte `i / 8`
//! at position `i % 8`, least significant first) and base64 encoded so it
//! can be embedded in JSON records.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::domain::hash_functions::HashKind;
use crate::error::FilterError;

/// Serialized Bloom filter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedBloomFilter {
    /// Base64 of the packed bit array
    pub bits: String,
    /// Filter size in bits (m)
    pub size_bits: usize,
    /// Number of hash functions (k)
    pub hash_count: usize,
    /// Number of insertions (n)
    pub inserted_count: usize,
    /// Strategy that produced the bit positions
    #[serde(default)]
    pub hash: HashKind,
}

/// Number of bytes needed to pack `size_bits` bits.
pub fn packed_len(size_bits: usize) -> usize {
    size_bits.div_ceil(8)
}

/// Encode packed bytes, clearing bits past `size_bits` in the last byte.
pub fn encode_bits(packed: &[u8], size_bits: usize) -> String {
    let mut bytes = packed.to_vec();
    let tail = size_bits % 8;
    if tail != 0 {
        if let Some(last) = bytes.last_mut() {
            *last &= (1u8 << tail) - 1;
        }
    }
    STANDARD.encode(bytes)
}

/// Decode packed bytes, checking the length against `size_bits`.
pub fn decode_bits(encoded: &str, size_bits: usize) -> Result<Vec<u8>, FilterError> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| FilterError::Encoding(e.to_string()))?;

    let expected = packed_len(size_bits);
    if bytes.len() != expected {
        return Err(FilterError::SizeMismatch {
            expected_bytes: expected,
            actual_bytes: bytes.len(),
        });
    }

    Ok(bytes)
}
