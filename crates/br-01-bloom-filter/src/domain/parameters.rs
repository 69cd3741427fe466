//! Bloom filter parameter calculation
//!
//! Formulas:
//! - FPR = (1 - e^(-kn/m))^k
//! - m = -n*ln(fpr) / (ln(2)^2)  -- optimal bits
//! - k = (m/n) * ln(2)           -- optimal hash functions

use std::f64::consts::LN_2;

/// Smallest bit array ever allocated.
pub const MIN_SIZE_BITS: usize = 64;

/// Tightest false positive rate a filter is sized for (about 43 bits per element).
pub const MIN_TARGET_FPR: f64 = 1e-9;

/// Loosest false positive rate a filter is sized for.
pub const MAX_TARGET_FPR: f64 = 0.5;

/// Bloom filter parameters
#[derive(Clone, Debug, PartialEq)]
pub struct BloomFilterParams {
    /// Number of bits in the filter
    pub size_bits: usize,
    /// Number of hash functions
    pub hash_count: usize,
    /// Expected false positive rate with these parameters
    pub expected_fpr: f64,
}

/// Bit array size for a fixed bits-per-element ratio.
///
/// `max(min_bits, ceil(expected_elements * bits_per_element))`
pub fn size_for(expected_elements: usize, bits_per_element: f64, min_bits: usize) -> usize {
    let wanted = (expected_elements as f64 * bits_per_element).ceil();
    if wanted.is_finite() && wanted > 0.0 {
        (wanted as usize).max(min_bits)
    } else {
        min_bits
    }
}

/// Calculate optimal Bloom filter parameters for given constraints
///
/// # Arguments
/// * `num_elements` - Expected number of elements to insert (n)
/// * `target_fpr` - Target false positive rate, clamped to
///   `MIN_TARGET_FPR..=MAX_TARGET_FPR` (NaN counts as the loosest rate)
pub fn optimal_parameters(num_elements: usize, target_fpr: f64) -> BloomFilterParams {
    if num_elements == 0 {
        return BloomFilterParams {
            size_bits: MIN_SIZE_BITS,
            hash_count: 1,
            expected_fpr: 0.0,
        };
    }

    let target_fpr = if target_fpr.is_nan() {
        MAX_TARGET_FPR
    } else {
        target_fpr.clamp(MIN_TARGET_FPR, MAX_TARGET_FPR)
    };
    let n = num_elements as f64;
    let ln2_squared = LN_2 * LN_2;

    let m = ((-n * target_fpr.ln() / ln2_squared).ceil() as usize).max(MIN_SIZE_BITS);
    let k = ((m as f64 / n) * LN_2).round() as usize;
    let k = k.clamp(1, 32);

    BloomFilterParams {
        size_bits: m,
        hash_count: k,
        expected_fpr: calculate_fpr(m, num_elements, k),
    }
}

/// Calculate the false positive rate for given parameters
///
/// Formula: FPR = (1 - e^(-kn/m))^k, and 0 for an empty filter.
pub fn calculate_fpr(m: usize, n: usize, k: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    if m == 0 {
        return 1.0;
    }
    let exponent = -(k as f64) * (n as f64) / (m as f64);
    (1.0 - exponent.exp()).powi(k as i32)
}
