//! # Batched Block-List Fetch
//!
//! Fetches the block lists of one chunk of followed users concurrently and
//! turns each result into the cache entry it implies.

use br_01_bloom_filter::{BloomConfig, BloomFilter};
use br_02_cache_store::BlockSet;
use futures::future::join_all;
use shared_types::{fetch_block_list, Did, FollowedUser, GraphApi, GraphError, StorageProfile, Timestamp};

/// Result of fetching one user's block list.
#[derive(Debug)]
pub struct UserFetch<'a> {
    /// The user the fetch was for.
    pub user: &'a FollowedUser,
    /// Blocked identities, or the failure.
    pub result: Result<Vec<Did>, GraphError>,
}

/// Fetch every user of `chunk` concurrently.
///
/// One failure never cancels the others. Results keep chunk order.
pub async fn fetch_chunk<'a, G>(graph: &G, chunk: &'a [FollowedUser]) -> Vec<UserFetch<'a>>
where
    G: GraphApi + ?Sized,
{
    join_all(chunk.iter().map(|user| async move {
        UserFetch {
            user,
            result: fetch_block_list(graph, &user.did).await,
        }
    }))
    .await
}

/// What a successful fetch does to the user's cache entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryUpdate {
    /// Replace the entry wholesale.
    Store(BlockSet),
    /// The user blocks nobody; drop any entry.
    Remove,
}

/// Build the cache entry for a fetched block list under `profile`.
pub fn build_entry(
    blocks: Vec<Did>,
    profile: StorageProfile,
    bloom: &BloomConfig,
    now: Timestamp,
) -> EntryUpdate {
    if blocks.is_empty() {
        return EntryUpdate::Remove;
    }
    match profile {
        StorageProfile::Exact => EntryUpdate::Store(BlockSet::exact(blocks, now)),
        StorageProfile::Probabilistic => {
            let mut blocks = blocks;
            blocks.sort_unstable();
            blocks.dedup();
            let filter = BloomFilter::from_items(&blocks, bloom);
            EntryUpdate::Store(BlockSet::probabilistic(filter, now))
        }
    }
}

/// Per-user error line as recorded in the sync status.
pub fn describe_failure(user: &FollowedUser, error: &GraphError) -> String {
    format!("{}: {}", user.handle, error)
}
