//! # Sync Outcomes

use serde::{Deserialize, Serialize};
use shared_types::Did;

/// Why a pass did not run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Another pass holds a live lease.
    AlreadyRunning {
        /// Milliseconds since the holder's last heartbeat.
        heartbeat_age_ms: u64,
    },
    /// No identity is logged in.
    NotAuthenticated,
}

/// Summary of a completed pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Identity the pass ran for.
    pub owner_id: Did,
    /// Accounts in the follow list.
    pub total_follows: usize,
    /// Accounts whose block list was fetched.
    pub synced_follows: usize,
    /// Per-user and persistence errors, in the order they happened.
    pub errors: Vec<String>,
    /// Block entries present in the final cache.
    pub entries_stored: usize,
    /// Entries dropped because the account is no longer followed.
    pub entries_pruned: usize,
    /// Entries dropped to satisfy the storage quota.
    pub entries_evicted: usize,
    /// The pass rebuilt a missing or structurally incomplete cache.
    pub first_sync: bool,
    /// The pass took over an expired lease.
    pub reclaimed_stale_lock: bool,
    /// Wall time of the pass in milliseconds.
    pub elapsed_ms: u64,
}

impl SyncReport {
    /// Users whose fetch failed.
    pub fn failed_follows(&self) -> usize {
        self.total_follows.saturating_sub(self.synced_follows)
    }
}

/// Result of asking the engine to run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The pass ran to the end.
    Completed(SyncReport),
    /// The pass did not run.
    Skipped(SkipReason),
}

impl SyncOutcome {
    /// The report, if the pass ran.
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            SyncOutcome::Completed(report) => Some(report),
            SyncOutcome::Skipped(_) => None,
        }
    }

    /// True if the pass was skipped.
    pub fn is_skipped(&self) -> bool {
        matches!(self, SyncOutcome::Skipped(_))
    }
}
