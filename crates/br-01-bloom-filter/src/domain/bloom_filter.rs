//! Core Bloom Filter implementation
//!
//! INVARIANTS:
//! - INVARIANT-1: `size_bits = max(min, ceil(expected * bits_per_element))`,
//!   fixed at creation. The filter is never resized; inserting past the
//!   design capacity only degrades the false positive rate.
//! - INVARIANT-2: No false negatives - if added, `might_contain()` MUST return true.
//! - INVARIANT-3: `decode(encode(f)) == f` bit for bit.

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use super::config::{BloomConfig, MAX_HASH_COUNT};
use super::encoding::{decode_bits, encode_bits, EncodedBloomFilter};
use super::hash_functions::{compute_bit_positions, HashKind, HashStrategy};
use super::parameters::{calculate_fpr, optimal_parameters, size_for, MIN_SIZE_BITS};
use crate::error::FilterError;

/// Bloom filter for probabilistic membership testing
///
/// Persists as an [`EncodedBloomFilter`], so it can be embedded directly in
/// JSON records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EncodedBloomFilter", into = "EncodedBloomFilter")]
pub struct BloomFilter {
    /// Bit array storing the filter state
    bits: BitVec<u8, Lsb0>,
    /// Size in bits (m)
    size_bits: usize,
    /// Number of hash functions (k)
    hash_count: usize,
    /// Number of insertions (n)
    inserted_count: usize,
    /// Strategy producing the base hashes
    hash: HashKind,
}

impl BloomFilter {
    /// Create an empty filter sized for `expected_elements`.
    ///
    /// Uses the default FNV-1a strategy. `hash_count` is clamped to `1..=32`.
    pub fn create(expected_elements: usize, bits_per_element: f64, hash_count: usize) -> Self {
        Self::with_strategy(
            expected_elements,
            bits_per_element,
            hash_count,
            HashKind::Fnv1a,
        )
    }

    /// Create an empty filter using the given hash strategy.
    pub fn with_strategy(
        expected_elements: usize,
        bits_per_element: f64,
        hash_count: usize,
        hash: HashKind,
    ) -> Self {
        let size_bits = size_for(expected_elements, bits_per_element, MIN_SIZE_BITS);
        Self::empty(size_bits, hash_count, hash)
    }

    /// Create an empty filter from a configuration.
    pub fn from_config(expected_elements: usize, config: &BloomConfig) -> Self {
        let size_bits = size_for(
            expected_elements,
            config.bits_per_element,
            config.min_size_bits.max(1),
        );
        Self::empty(size_bits, config.hash_count, config.hash)
    }

    /// Create an empty filter with optimal parameters for a target FPR.
    ///
    /// Out-of-range targets are clamped, see [`optimal_parameters`].
    pub fn with_target_fpr(expected_elements: usize, target_fpr: f64) -> Self {
        let params = optimal_parameters(expected_elements, target_fpr);
        Self::empty(params.size_bits, params.hash_count, HashKind::Fnv1a)
    }

    /// Build a filter holding every item of `items`.
    pub fn from_items<S: AsRef<str>>(items: &[S], config: &BloomConfig) -> Self {
        let mut filter = Self::from_config(items.len(), config);
        for item in items {
            filter.add(item.as_ref());
        }
        filter
    }

    fn empty(size_bits: usize, hash_count: usize, hash: HashKind) -> Self {
        let size_bits = size_bits.max(1);
        Self {
            bits: bitvec![u8, Lsb0; 0; size_bits],
            size_bits,
            hash_count: hash_count.clamp(1, MAX_HASH_COUNT),
            inserted_count: 0,
            hash,
        }
    }

    fn strategy(&self) -> &'static dyn HashStrategy {
        self.hash.strategy()
    }

    /// Add an item.
    ///
    /// Setting an already-set bit is a no-op; the insertion count always grows.
    pub fn add(&mut self, item: &str) {
        for pos in compute_bit_positions(
            self.strategy(),
            item.as_bytes(),
            self.hash_count,
            self.size_bits,
        ) {
            self.bits.set(pos, true);
        }
        self.inserted_count += 1;
    }

    /// Test if an item might be in the filter
    ///
    /// Returns:
    /// - `false` if the item is definitely NOT in the set (never a false negative)
    /// - `true` if every required bit is set (possibly a false positive)
    pub fn might_contain(&self, item: &str) -> bool {
        compute_bit_positions(
            self.strategy(),
            item.as_bytes(),
            self.hash_count,
            self.size_bits,
        )
        .all(|pos| self.bits[pos])
    }

    /// Estimated false positive rate at the current load
    ///
    /// Formula: FPR = (1 - e^(-kn/m))^k, and 0 when nothing was added.
    pub fn estimate_false_positive_rate(&self) -> f64 {
        calculate_fpr(self.size_bits, self.inserted_count, self.hash_count)
    }

    /// Get the filter size in bits
    pub fn size_bits(&self) -> usize {
        self.size_bits
    }

    /// Get the number of hash functions
    pub fn hash_count(&self) -> usize {
        self.hash_count
    }

    /// Get the number of insertions
    pub fn inserted_count(&self) -> usize {
        self.inserted_count
    }

    /// Get the hash strategy identifier
    pub fn hash_kind(&self) -> HashKind {
        self.hash
    }

    /// Get the number of bits set in the filter
    pub fn bits_set(&self) -> usize {
        self.bits.count_ones()
    }

    /// Fraction of bits set (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f64 {
        self.bits_set() as f64 / self.size_bits as f64
    }

    /// Encode into the persisted form
    pub fn encode(&self) -> EncodedBloomFilter {
        EncodedBloomFilter {
            bits: encode_bits(self.bits.as_raw_slice(), self.size_bits),
            size_bits: self.size_bits,
            hash_count: self.hash_count,
            inserted_count: self.inserted_count,
            hash: self.hash,
        }
    }

    /// Decode from the persisted form
    pub fn decode(encoded: &EncodedBloomFilter) -> Result<Self, FilterError> {
        if encoded.size_bits == 0 {
            return Err(FilterError::InvalidParameters(
                "size_bits cannot be 0".to_string(),
            ));
        }
        if encoded.hash_count == 0 || encoded.hash_count > MAX_HASH_COUNT {
            return Err(FilterError::InvalidParameters(format!(
                "hash_count {} outside 1..={}",
                encoded.hash_count, MAX_HASH_COUNT
            )));
        }

        let bytes = decode_bits(&encoded.bits, encoded.size_bits)?;
        let mut bits = BitVec::<u8, Lsb0>::from_vec(bytes);
        bits.truncate(encoded.size_bits);

        Ok(Self {
            bits,
            size_bits: encoded.size_bits,
            hash_count: encoded.hash_count,
            inserted_count: encoded.inserted_count,
            hash: encoded.hash,
        })
    }
}

impl From<BloomFilter> for EncodedBloomFilter {
    fn from(filter: BloomFilter) -> Self {
        filter.encode()
    }
}

impl TryFrom<EncodedBloomFilter> for BloomFilter {
    type Error = FilterError;

    fn try_from(encoded: EncodedBloomFilter) -> Result<Self, Self::Error> {
        BloomFilter::decode(&encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_create_sizes_per_ratio() {
        let filter = BloomFilter::create(100, 10.0, 7);

        assert_eq!(filter.size_bits(), 1000, "100 elements * 10 bits");
        assert_eq!(filter.hash_count(), 7);
        assert_eq!(filter.inserted_count(), 0);
        assert_eq!(filter.bits_set(), 0, "All bits should be zero initially");
    }

    #[test]
    fn test_create_applies_minimum_size() {
        assert_eq!(BloomFilter::create(0, 10.0, 7).size_bits(), 64);
        assert_eq!(BloomFilter::create(2, 10.0, 7).size_bits(), 64);
    }

    #[test]
    fn test_add_sets_at_most_k_bits() {
        let mut filter = BloomFilter::create(100, 10.0, 7);
        filter.add("did:plc:alice");

        assert!(filter.bits_set() > 0);
        assert!(filter.bits_set() <= 7);

        // Re-adding sets no new bits but still counts the insertion.
        let before = filter.bits_set();
        filter.add("did:plc:alice");
        assert_eq!(filter.bits_set(), before);
        assert_eq!(filter.inserted_count(), 2);
    }

    #[test]
    fn test_no_false_negatives_bulk() {
        let mut filter = BloomFilter::create(1000, 10.0, 7);
        let items: Vec<String> = (0..1000).map(|i| format!("did:plc:{:06}", i)).collect();

        for item in &items {
            filter.add(item);
        }

        for item in &items {
            assert!(
                filter.might_contain(item),
                "INVARIANT-2 VIOLATED: False negative for {}",
                item
            );
        }
    }

    #[test]
    fn test_empty_filter_contains_nothing() {
        let filter = BloomFilter::create(10, 10.0, 7);
        assert!(!filter.might_contain("did:plc:anyone"));
        assert_eq!(filter.estimate_false_positive_rate(), 0.0);
    }

    #[test]
    fn test_empirical_fpr_tracks_estimate() {
        for hash in [HashKind::Fnv1a, HashKind::Murmur3] {
            let n = 2_000;
            let mut filter = BloomFilter::with_strategy(n, 10.0, 7, hash);
            for i in 0..n {
                filter.add(&format!("did:plc:member{}", i));
            }

            let trials = 100_000;
            let false_positives = (0..trials)
                .filter(|i| filter.might_contain(&format!("did:web:outsider{}.example", i)))
                .count();
            let empirical = false_positives as f64 / trials as f64;
            let predicted = filter.estimate_false_positive_rate();

            // Allow 1.5x the predicted rate (plus slack for small counts).
            assert!(
                empirical <= predicted * 1.5 + 0.002,
                "{}: empirical FPR {} too far from predicted {}",
                hash,
                empirical,
                predicted
            );
        }
    }

    #[test]
    fn test_overfilled_filter_degrades_without_resizing() {
        let mut filter = BloomFilter::create(10, 10.0, 7);
        let size = filter.size_bits();
        for i in 0..200 {
            filter.add(&format!("did:plc:{}", i));
        }
        assert_eq!(filter.size_bits(), size);
        assert!(filter.estimate_false_positive_rate() > 0.5);
        assert!(filter.might_contain("did:plc:199"));
    }

    #[test]
    fn test_from_items() {
        let items = ["did:plc:a", "did:plc:b", "did:plc:c"];
        let filter = BloomFilter::from_items(&items, &BloomConfig::default());

        assert_eq!(filter.size_bits(), 64);
        assert_eq!(filter.inserted_count(), 3);
        assert!(items.iter().all(|i| filter.might_contain(i)));
    }

    #[test]
    fn test_with_target_fpr() {
        let filter = BloomFilter::with_target_fpr(100, 0.01);
        assert!(filter.size_bits() >= 900);
        assert!((5..=9).contains(&filter.hash_count()));
    }

    #[test]
    fn test_with_zero_target_fpr_stays_bounded() {
        let mut filter = BloomFilter::with_target_fpr(1_000, 0.0);
        assert!(filter.size_bits() <= 1_000 * 64);
        assert_eq!(filter.hash_count(), 30);
        filter.add("did:plc:x");
        assert!(filter.might_contain("did:plc:x"));
    }

    #[test]
    fn test_json_embedding_is_text_safe() {
        let mut filter = BloomFilter::create(20, 10.0, 7);
        filter.add("did:plc:x");

        let json = serde_json::to_string(&filter).unwrap();
        assert!(json.contains("\"bits\":\""));

        let restored: BloomFilter = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, filter);
        assert!(restored.might_contain("did:plc:x"));
    }

    #[test]
    fn test_decode_rejects_bad_hash_count() {
        let mut encoded = BloomFilter::create(10, 10.0, 7).encode();
        encoded.hash_count = 0;
        assert!(BloomFilter::decode(&encoded).is_err());
    }

    #[test]
    fn test_decode_keeps_strategy() {
        let mut filter = BloomFilter::with_strategy(50, 10.0, 7, HashKind::Murmur3);
        filter.add("did:plc:m");
        let restored = BloomFilter::decode(&filter.encode()).unwrap();
        assert_eq!(restored.hash_kind(), HashKind::Murmur3);
        assert!(restored.might_contain("did:plc:m"));
    }

    proptest! {
        #[test]
        fn prop_no_false_negatives(
            items in proptest::collection::vec("[a-z0-9:.]{1,40}", 0..200),
            expected in 0usize..300,
        ) {
            let mut filter = BloomFilter::create(expected, 10.0, 7);
            for item in &items {
                filter.add(item);
            }
            for item in &items {
                prop_assert!(filter.might_contain(item));
            }
        }

        #[test]
        fn prop_encoding_round_trip_is_exact(
            items in proptest::collection::vec("[a-z0-9:.]{1,40}", 0..100),
            expected in 0usize..200,
            bits_per_element in 1.0f64..16.0,
            hash_count in 1usize..12,
        ) {
            let mut filter = BloomFilter::create(expected, bits_per_element, hash_count);
            for item in &items {
                filter.add(item);
            }

            let restored = BloomFilter::decode(&filter.encode()).unwrap();

            prop_assert_eq!(&restored, &filter);
            prop_assert_eq!(restored.encode(), filter.encode());
        }
    }
}
