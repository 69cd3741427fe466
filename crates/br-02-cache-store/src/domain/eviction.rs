//! # Quota Eviction
//!
//! Removes per-user block entries, largest contribution first, until the
//! serialized cache fits under a byte ceiling.
//!
//! Contributions are estimated per entry (`"key":value,` in the JSON object)
//! and the real size is re-measured before stopping, so the result is exact
//! even where the estimate is off by a separator byte.

use shared_types::Did;

use super::entities::{BlockSet, Cache};
use super::errors::StoreError;

/// Outcome of an eviction run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvictionReport {
    /// Evicted users, in eviction order.
    pub removed: Vec<Did>,
    pub bytes_before: usize,
    pub bytes_after: usize,
}

impl EvictionReport {
    pub fn bytes_reclaimed(&self) -> usize {
        self.bytes_before.saturating_sub(self.bytes_after)
    }

    /// True if the cache was already small enough.
    pub fn is_noop(&self) -> bool {
        self.removed.is_empty()
    }
}

/// Bytes one entry adds to the serialized `blockSets` object.
pub fn entry_size(did: &str, set: &BlockSet) -> Result<usize, StoreError> {
    let key = serde_json::to_vec(did)?.len();
    let value = serde_json::to_vec(set)?.len();
    // colon + separating comma
    Ok(key + value + 2)
}

/// Evict entries until `cache` serializes to at most `ceiling` bytes.
///
/// The cache may still exceed `ceiling` once every entry is gone, if the
/// follow list alone is larger; callers see that in `bytes_after`.
pub fn evict_to_fit(cache: &mut Cache, ceiling: usize) -> Result<EvictionReport, StoreError> {
    let bytes_before = cache.serialized_size()?;
    if bytes_before <= ceiling {
        return Ok(EvictionReport {
            removed: Vec::new(),
            bytes_before,
            bytes_after: bytes_before,
        });
    }

    let mut ranked = cache
        .block_sets
        .iter()
        .map(|(did, set)| Ok((did.clone(), entry_size(did, set)?)))
        .collect::<Result<Vec<_>, StoreError>>()?;
    // Largest first; ties broken by id so runs are deterministic.
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut projected = bytes_before;
    let mut removed = Vec::new();
    for (did, size) in ranked {
        if projected <= ceiling {
            projected = cache.serialized_size()?;
            if projected <= ceiling {
                break;
            }
        }
        cache.block_sets.remove(&did);
        projected = projected.saturating_sub(size);
        removed.push(did);
    }

    let bytes_after = cache.serialized_size()?;
    Ok(EvictionReport {
        removed,
        bytes_before,
        bytes_after,
    })
}
