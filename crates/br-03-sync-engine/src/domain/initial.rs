//! # Initial Sync Heuristic

use br_02_cache_store::Cache;

use crate::config::SyncConfig;

/// True if `cache` should be rebuilt as if it were the first sync.
///
/// That is the case when there is no cache, it never completed a pass, or it
/// looks structurally incomplete: at least `incomplete_min_follows` follows
/// but fewer block entries than `incomplete_threshold` of them.
pub fn needs_initial_sync(cache: Option<&Cache>, config: &SyncConfig) -> bool {
    let Some(cache) = cache else {
        return true;
    };
    if cache.last_full_sync_at.is_none() {
        return true;
    }

    let follows = cache.followed_users.len();
    if follows < config.incomplete_min_follows {
        return false;
    }
    (cache.block_sets.len() as f64) < follows as f64 * config.incomplete_threshold
}
