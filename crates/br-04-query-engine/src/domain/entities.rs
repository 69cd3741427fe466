//! # Lookup Results

use serde::{Deserialize, Serialize};
use shared_types::{FollowedUser, Timestamp};

/// Block relationships between the follow set and one viewed account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockingInfo {
    /// Followed users who block the viewed account.
    pub blocked_by: Vec<FollowedUser>,
    /// Followed users the viewed account blocks.
    pub blocking: Vec<FollowedUser>,
    /// When the cache answering the lookup was last fully synced.
    pub last_full_sync_at: Option<Timestamp>,
}

impl BlockingInfo {
    /// True if neither direction has a match.
    pub fn is_empty(&self) -> bool {
        self.blocked_by.is_empty() && self.blocking.is_empty()
    }
}

/// First pass over the cache for one viewed account.
#[derive(Debug, Default)]
pub struct CacheScan<'a> {
    /// Users whose exact block set contains the account.
    pub confirmed: Vec<&'a FollowedUser>,
    /// Users whose filter may contain the account, pending verification.
    pub candidates: Vec<&'a FollowedUser>,
}
