//! Hash functions for the Bloom filter
//!
//! Bit positions come from double hashing: `(h1 + i * h2) mod m` for
//! `i in 0..k`. The pair `(h1, h2)` is produced by a pluggable
//! [`HashStrategy`]; the second hash is seeded with the first so the two
//! values are not drawn from one correlated hash family.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;

/// FNV-1a 32-bit offset basis.
const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
/// FNV-1a 32-bit prime.
const FNV_PRIME: u32 = 0x0100_0193;

/// Produces the two base hashes used for double hashing.
pub trait HashStrategy: Send + Sync {
    /// Identifier persisted alongside filters built with this strategy.
    fn kind(&self) -> HashKind;

    /// Compute `(h1, h2)` for an item.
    fn hash_pair(&self, item: &[u8]) -> (u32, u32);
}

/// Persistable identifier of a built-in hash strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashKind {
    /// 32-bit FNV-1a.
    #[default]
    Fnv1a,
    /// 32-bit MurmurHash3.
    Murmur3,
}

impl HashKind {
    /// Strategy instance for this identifier.
    pub fn strategy(self) -> &'static dyn HashStrategy {
        match self {
            HashKind::Fnv1a => &Fnv1aStrategy,
            HashKind::Murmur3 => &Murmur3Strategy,
        }
    }
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashKind::Fnv1a => write!(f, "fnv1a"),
            HashKind::Murmur3 => write!(f, "murmur3"),
        }
    }
}

/// 32-bit FNV-1a with the seed folded into the offset basis.
pub fn fnv1a_32(item: &[u8], seed: u32) -> u32 {
    item.iter().fold(FNV_OFFSET_BASIS ^ seed, |hash, &byte| {
        (hash ^ byte as u32).wrapping_mul(FNV_PRIME)
    })
}

/// 32-bit MurmurHash3.
pub fn murmur3_32(item: &[u8], seed: u32) -> u32 {
    let mut cursor = Cursor::new(item);
    murmur3::murmur3_32(&mut cursor, seed).unwrap_or(0)
}

/// Default strategy: FNV-1a seeded with 0, then with `h1`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fnv1aStrategy;

impl HashStrategy for Fnv1aStrategy {
    fn kind(&self) -> HashKind {
        HashKind::Fnv1a
    }

    fn hash_pair(&self, item: &[u8]) -> (u32, u32) {
        let h1 = fnv1a_32(item, 0);
        let h2 = fnv1a_32(item, h1);
        (h1, h2)
    }
}

/// MurmurHash3 seeded with 0, then with `h1`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Murmur3Strategy;

impl HashStrategy for Murmur3Strategy {
    fn kind(&self) -> HashKind {
        HashKind::Murmur3
    }

    fn hash_pair(&self, item: &[u8]) -> (u32, u32) {
        let h1 = murmur3_32(item, 0);
        let h2 = murmur3_32(item, h1);
        (h1, h2)
    }
}

/// Compute the `k` bit positions of an item in an `m`-bit filter.
///
/// Arithmetic is done in 64 bits so `h1 + i * h2` never wraps.
pub fn compute_bit_positions(
    strategy: &dyn HashStrategy,
    item: &[u8],
    k: usize,
    m: usize,
) -> impl Iterator<Item = usize> {
    let (h1, h2) = strategy.hash_pair(item);
    let (h1, h2, m) = (h1 as u64, h2 as u64, m.max(1) as u64);
    (0..k as u64).map(move |i| ((h1 + i * h2) % m) as usize)
}
