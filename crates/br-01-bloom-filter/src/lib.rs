//! # BR-01 Bloom Filter
//!
//! Fixed-size probabilistic membership structure used to compress the block
//! lists of followed accounts.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O
//!   - `BloomFilter`: Core probabilistic data structure
//!   - `HashStrategy`: Pluggable `(h1, h2)` producer for double hashing
//!   - `BloomConfig`: Sizing configuration with validation
//!   - `EncodedBloomFilter`: Text-safe persisted form
//! - **Metrics** (`metrics`): Lock-free counters for builds and lookups
//!
//! ## Invariants
//!
//! - **INVARIANT-1**: `size_bits = max(64, ceil(n * bits_per_element))`, never resized
//! - **INVARIANT-2**: No false negatives - if added, `might_contain()` MUST return true
//! - **INVARIANT-3**: Encoding round trip is bit-for-bit exact
//!
//! ## Usage Example
//!
//! ```ignore
//! use br_01_bloom_filter::BloomFilter;
//!
//! let mut filter = BloomFilter::create(100, 10.0, 7);
//! filter.add("did:plc:abc");
//!
//! assert!(filter.might_contain("did:plc:abc"));
//! let restored = BloomFilter::decode(&filter.encode())?;
//! ```

pub mod domain;
pub mod error;
pub mod metrics;

// Re-exports for convenience
pub use domain::{
    BloomConfig, BloomFilter, EncodedBloomFilter, Fnv1aStrategy, HashKind, HashStrategy,
    Murmur3Strategy,
};
pub use error::FilterError;
pub use metrics::{FilterMetrics, FilterMetricsSnapshot};
