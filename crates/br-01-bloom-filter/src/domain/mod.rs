//! Domain Layer - Pure business logic
//!
//! This layer contains:
//! - Core Bloom filter implementation
//! - Hash strategies (double hashing)
//! - Parameter calculations
//! - Configuration
//! - Persisted encoding
//!
//! RULES:
//! - No I/O operations
//! - No async code
//! - Pure functions where possible

pub mod bloom_filter;
pub mod config;
pub mod encoding;
pub mod hash_functions;
pub mod parameters;

pub use bloom_filter::BloomFilter;
pub use config::{BloomConfig, MAX_HASH_COUNT};
pub use encoding::EncodedBloomFilter;
pub use hash_functions::{
    compute_bit_positions, Fnv1aStrategy, HashKind, HashStrategy, Murmur3Strategy,
};
pub use parameters::{
    calculate_fpr, optimal_parameters, size_for, BloomFilterParams, MAX_TARGET_FPR, MIN_SIZE_BITS,
    MIN_TARGET_FPR,
};
