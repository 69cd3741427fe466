//! # Domain Entities
//!
//! The persisted aggregates: the root [`Cache`] with its per-user
//! [`BlockSet`]s, and the [`SyncStatus`] lease record.

use std::collections::{BTreeMap, HashSet};

use br_01_bloom_filter::BloomFilter;
use serde::{Deserialize, Deserializer, Serialize};
use shared_types::{Did, FollowedUser, StorageProfile, Timestamp};

use super::errors::StoreError;

/// Block data of one followed user.
///
/// Each sync pass replaces a user's entry wholesale; entries are never merged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum BlockSet {
    /// Raw list of blocked identities, sorted and deduplicated.
    Exact {
        #[serde(deserialize_with = "sorted_dids")]
        blocks: Vec<Did>,
        last_synced: Timestamp,
    },
    /// Bloom filter over the blocked identities.
    Probabilistic {
        bloom_filter: BloomFilter,
        approx_count: usize,
        last_synced: Timestamp,
    },
}

fn sort_dids(blocks: &mut Vec<Did>) {
    blocks.sort_unstable();
    blocks.dedup();
}

/// Stored lists are re-sorted on load so lookups can binary search them.
fn sorted_dids<'de, D>(deserializer: D) -> Result<Vec<Did>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut blocks = Vec::<Did>::deserialize(deserializer)?;
    sort_dids(&mut blocks);
    Ok(blocks)
}

impl BlockSet {
    pub fn exact(mut blocks: Vec<Did>, last_synced: Timestamp) -> Self {
        sort_dids(&mut blocks);
        BlockSet::Exact {
            blocks,
            last_synced,
        }
    }

    pub fn probabilistic(bloom_filter: BloomFilter, last_synced: Timestamp) -> Self {
        BlockSet::Probabilistic {
            approx_count: bloom_filter.inserted_count(),
            bloom_filter,
            last_synced,
        }
    }

    pub fn last_synced(&self) -> Timestamp {
        match self {
            BlockSet::Exact { last_synced, .. } | BlockSet::Probabilistic { last_synced, .. } => {
                *last_synced
            }
        }
    }

    pub fn profile(&self) -> StorageProfile {
        match self {
            BlockSet::Exact { .. } => StorageProfile::Exact,
            BlockSet::Probabilistic { .. } => StorageProfile::Probabilistic,
        }
    }

    /// Number of blocked identities (approximate for filters).
    pub fn len(&self) -> usize {
        match self {
            BlockSet::Exact { blocks, .. } => blocks.len(),
            BlockSet::Probabilistic { approx_count, .. } => *approx_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Root aggregate, pinned to one identity and one storage profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cache {
    pub owner_id: Did,
    #[serde(default)]
    pub profile: StorageProfile,
    #[serde(default)]
    pub followed_users: Vec<FollowedUser>,
    #[serde(default)]
    pub block_sets: BTreeMap<Did, BlockSet>,
    #[serde(default)]
    pub last_full_sync_at: Option<Timestamp>,
}

impl Cache {
    pub fn empty(owner_id: impl Into<Did>, profile: StorageProfile) -> Self {
        Self {
            owner_id: owner_id.into(),
            profile,
            followed_users: Vec::new(),
            block_sets: BTreeMap::new(),
            last_full_sync_at: None,
        }
    }

    /// True if this cache may be served to `owner_id` under `profile`.
    pub fn belongs_to(&self, owner_id: &str, profile: StorageProfile) -> bool {
        self.owner_id == owner_id && self.profile == profile
    }

    pub fn followed_user(&self, did: &str) -> Option<&FollowedUser> {
        self.followed_users.iter().find(|u| u.did == did)
    }

    /// Drop block entries of accounts that are no longer followed.
    ///
    /// Returns the number of entries removed.
    pub fn prune_unfollowed(&mut self) -> usize {
        let followed: HashSet<&str> = self.followed_users.iter().map(|u| u.did.as_str()).collect();
        let before = self.block_sets.len();
        self.block_sets.retain(|did, _| followed.contains(did.as_str()));
        before - self.block_sets.len()
    }

    /// Size of the JSON record this cache persists as.
    pub fn serialized_size(&self) -> Result<usize, StoreError> {
        Ok(serde_json::to_vec(self)?.len())
    }
}

/// Progress and lease record of the sync engine.
///
/// `last_heartbeat_at` is refreshed on every status update and decides
/// whether a `running` lease is still live.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncStatus {
    pub total_follows: usize,
    pub synced_follows: usize,
    pub last_sync_at: Option<Timestamp>,
    pub running: bool,
    pub last_heartbeat_at: Timestamp,
    pub errors: Vec<String>,
}

/// Partial update of [`SyncStatus`]; `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusUpdate {
    pub total_follows: Option<usize>,
    pub synced_follows: Option<usize>,
    pub last_sync_at: Option<Timestamp>,
    pub running: Option<bool>,
    pub errors: Option<Vec<String>>,
}

impl StatusUpdate {
    pub fn progress(total_follows: usize, synced_follows: usize) -> Self {
        Self {
            total_follows: Some(total_follows),
            synced_follows: Some(synced_follows),
            ..Default::default()
        }
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_running(mut self, running: bool) -> Self {
        self.running = Some(running);
        self
    }

    pub fn with_last_sync_at(mut self, at: Timestamp) -> Self {
        self.last_sync_at = Some(at);
        self
    }

    /// Apply set fields and stamp the heartbeat.
    pub fn apply(self, status: &mut SyncStatus, now: Timestamp) {
        if let Some(v) = self.total_follows {
            status.total_follows = v;
        }
        if let Some(v) = self.synced_follows {
            status.synced_follows = v;
        }
        if let Some(v) = self.last_sync_at {
            status.last_sync_at = Some(v);
        }
        if let Some(v) = self.running {
            status.running = v;
        }
        if let Some(v) = self.errors {
            status.errors = v;
        }
        status.last_heartbeat_at = now;
    }
}

/// Diagnostics about the persisted cache.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub owner_id: Option<Did>,
    pub profile: Option<StorageProfile>,
    pub followed: usize,
    pub entries: usize,
    pub serialized_bytes: usize,
    pub quota_bytes: usize,
    pub last_full_sync_at: Option<Timestamp>,
}

impl CacheStats {
    pub fn from_cache(cache: &Cache, serialized_bytes: usize, quota_bytes: usize) -> Self {
        Self {
            owner_id: Some(cache.owner_id.clone()),
            profile: Some(cache.profile),
            followed: cache.followed_users.len(),
            entries: cache.block_sets.len(),
            serialized_bytes,
            quota_bytes,
            last_full_sync_at: cache.last_full_sync_at,
        }
    }
}
