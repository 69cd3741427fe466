//! # Sync Lease
//!
//! The "a pass is running" flag is a lease, not a mutex: the process owning
//! it may be killed at any point. The lease lives in [`SyncStatus`] and is
//! held while `running` is set and its heartbeat is younger than the stale
//! timeout. An expired lease is reclaimed by the next caller.

use std::time::Duration;

use br_02_cache_store::SyncStatus;
use serde::{Deserialize, Serialize};
use shared_types::Timestamp;

/// Observed state of the lease.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LockState {
    /// No pass is running.
    Free,
    /// A pass is running and its heartbeat is fresh.
    Held {
        /// Milliseconds since the last heartbeat.
        heartbeat_age_ms: u64,
    },
    /// A pass claims to run but stopped heart-beating.
    Stale {
        /// Milliseconds since the last heartbeat.
        heartbeat_age_ms: u64,
    },
}

impl LockState {
    /// Classify `status` at time `now`.
    pub fn of(status: &SyncStatus, now: Timestamp, stale_timeout: Duration) -> Self {
        if !status.running {
            return LockState::Free;
        }
        let heartbeat_age_ms = now.saturating_sub(status.last_heartbeat_at);
        if is_stale(heartbeat_age_ms, stale_timeout) {
            LockState::Stale { heartbeat_age_ms }
        } else {
            LockState::Held { heartbeat_age_ms }
        }
    }

    /// True if a new pass may start.
    pub fn is_acquirable(&self) -> bool {
        !matches!(self, LockState::Held { .. })
    }
}

/// Staleness predicate of the lease.
pub fn is_stale(heartbeat_age_ms: u64, stale_timeout: Duration) -> bool {
    u128::from(heartbeat_age_ms) >= stale_timeout.as_millis()
}

/// Result of an acquisition attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeaseDecision {
    /// The lease is ours.
    Acquired {
        /// The previous holder's lease had expired.
        reclaimed_stale: bool,
    },
    /// Another pass holds a live lease.
    Busy {
        /// Milliseconds since the holder's last heartbeat.
        heartbeat_age_ms: u64,
    },
}

/// Try to take the lease, mutating `status` in place on success.
///
/// Meant to run inside an atomic status read-modify-write. On success the
/// status is reset to idle, then marked running with an empty error list
/// and a fresh heartbeat.
pub fn try_acquire(status: &mut SyncStatus, now: Timestamp, stale_timeout: Duration) -> LeaseDecision {
    let reclaimed_stale = match LockState::of(status, now, stale_timeout) {
        LockState::Held { heartbeat_age_ms } => return LeaseDecision::Busy { heartbeat_age_ms },
        LockState::Stale { .. } => true,
        LockState::Free => false,
    };

    // Progress counters and errors start over; the last completed sync survives.
    *status = SyncStatus {
        running: true,
        last_heartbeat_at: now,
        total_follows: status.total_follows,
        last_sync_at: status.last_sync_at,
        ..SyncStatus::default()
    };

    LeaseDecision::Acquired { reclaimed_stale }
}
