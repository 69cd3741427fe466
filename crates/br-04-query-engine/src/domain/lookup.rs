//! # Cache Lookup
//!
//! Pure scans of a [`Cache`] for one viewed account. Results follow the
//! order of the cached follow list.

use br_02_cache_store::{BlockSet, Cache};
use shared_types::FollowedUser;

use super::entities::CacheScan;
use super::membership::MembershipIndex;

/// Split followed users into confirmed blockers and filter candidates.
///
/// Exact entries are decided here. Probabilistic entries only nominate
/// candidates; the caller verifies them against live data.
pub fn scan_blocked_by<'a>(cache: &'a Cache, profile_id: &str, threshold: usize) -> CacheScan<'a> {
    let mut scan = CacheScan::default();
    for user in &cache.followed_users {
        match cache.block_sets.get(&user.did) {
            Some(BlockSet::Exact { blocks, .. }) => {
                if MembershipIndex::sorted(blocks, threshold).contains(profile_id) {
                    scan.confirmed.push(user);
                }
            }
            Some(BlockSet::Probabilistic { bloom_filter, .. }) => {
                if bloom_filter.might_contain(profile_id) {
                    scan.candidates.push(user);
                }
            }
            None => {}
        }
    }
    scan
}

/// Followed users that appear in the viewed account's own block list.
pub fn find_blocking(cache: &Cache, profile_blocks: &[String], threshold: usize) -> Vec<FollowedUser> {
    if profile_blocks.is_empty() {
        return Vec::new();
    }
    let index = MembershipIndex::build(profile_blocks, threshold);
    cache
        .followed_users
        .iter()
        .filter(|user| index.contains(&user.did))
        .cloned()
        .collect()
}
