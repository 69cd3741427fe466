//! Bloom filter configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use br_01_bloom_filter::domain::BloomConfig;
//!
//! let config = BloomConfig::default()
//!     .with_bits_per_element(12.0)
//!     .with_hash_count(8);
//! config.validate()?;
//! ```

use crate::domain::hash_functions::HashKind;
use crate::domain::parameters::{calculate_fpr, MIN_SIZE_BITS};
use crate::error::FilterError;
use serde::{Deserialize, Serialize};

/// Largest hash count accepted.
pub const MAX_HASH_COUNT: usize = 32;

/// Bloom filter configuration
///
/// The defaults (10 bits per element, 7 hashes) give roughly a 1% false
/// positive rate when a filter holds exactly its expected element count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BloomConfig {
    /// Bits allocated per expected element
    pub bits_per_element: f64,
    /// Number of hash functions (k)
    pub hash_count: usize,
    /// Floor on the bit array size
    pub min_size_bits: usize,
    /// Hash strategy used for new filters
    pub hash: HashKind,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            bits_per_element: 10.0,
            hash_count: 7,
            min_size_bits: MIN_SIZE_BITS,
            hash: HashKind::Fnv1a,
        }
    }
}

impl BloomConfig {
    /// Validate parameter ranges
    pub fn validate(&self) -> Result<(), FilterError> {
        if !self.bits_per_element.is_finite() || self.bits_per_element < 1.0 {
            return Err(FilterError::InvalidParameters(format!(
                "bits_per_element must be >= 1, got {}",
                self.bits_per_element
            )));
        }

        if self.hash_count == 0 || self.hash_count > MAX_HASH_COUNT {
            return Err(FilterError::InvalidParameters(format!(
                "hash_count must be in 1..={}, got {}",
                MAX_HASH_COUNT, self.hash_count
            )));
        }

        if self.min_size_bits == 0 {
            return Err(FilterError::InvalidParameters(
                "min_size_bits cannot be 0".to_string(),
            ));
        }

        Ok(())
    }

    /// False positive rate expected at the design load factor
    pub fn design_fpr(&self) -> f64 {
        // Any n works: at a fixed ratio the FPR depends only on m/n.
        let n = 1_000;
        let m = (n as f64 * self.bits_per_element).ceil() as usize;
        calculate_fpr(m, n, self.hash_count)
    }

    /// Builder-style method to set bits per element
    pub fn with_bits_per_element(mut self, bits: f64) -> Self {
        self.bits_per_element = bits;
        self
    }

    /// Builder-style method to set the hash count
    pub fn with_hash_count(mut self, k: usize) -> Self {
        self.hash_count = k;
        self
    }

    /// Builder-style method to set the hash strategy
    pub fn with_hash(mut self, hash: HashKind) -> Self {
        self.hash = hash;
        self
    }
}
