//! # Sync Phases
//!
//! `Idle → Locked → Enumerating → Fetching → Finalizing → Idle`.
//! Any phase may fall back to `Idle` when a pass is skipped or fails.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of the in-process sync pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SyncPhase {
    /// No pass running in this process.
    #[default]
    Idle,
    /// Lease acquired, identity and cache being loaded.
    Locked,
    /// Paging through the follow listing.
    Enumerating,
    /// Fetching block lists chunk by chunk.
    Fetching {
        /// Zero-based chunk being fetched.
        chunk: usize,
        /// Total chunks in this pass.
        chunks: usize,
    },
    /// Pruning, persisting and releasing the lease.
    Finalizing,
}

impl SyncPhase {
    fn ordinal(&self) -> u8 {
        match self {
            SyncPhase::Idle => 0,
            SyncPhase::Locked => 1,
            SyncPhase::Enumerating => 2,
            SyncPhase::Fetching { .. } => 3,
            SyncPhase::Finalizing => 4,
        }
    }

    /// True if moving from `self` to `next` follows the state machine.
    pub fn can_transition_to(&self, next: &SyncPhase) -> bool {
        match (self, next) {
            (_, SyncPhase::Idle) => true,
            (SyncPhase::Idle, SyncPhase::Locked) => true,
            (SyncPhase::Fetching { chunk: a, .. }, SyncPhase::Fetching { chunk: b, .. }) => b > a,
            // Enumeration may yield no follows, skipping the fetch phase.
            (SyncPhase::Enumerating, SyncPhase::Finalizing) => true,
            (current, next) => next.ordinal() == current.ordinal() + 1,
        }
    }

    /// True while a pass is in progress.
    pub fn is_active(&self) -> bool {
        !matches!(self, SyncPhase::Idle)
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPhase::Idle => write!(f, "idle"),
            SyncPhase::Locked => write!(f, "locked"),
            SyncPhase::Enumerating => write!(f, "enumerating"),
            SyncPhase::Fetching { chunk, chunks } => {
                write!(f, "fetching {}/{}", chunk + 1, chunks)
            }
            SyncPhase::Finalizing => write!(f, "finalizing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            SyncPhase::Idle,
            SyncPhase::Locked,
            SyncPhase::Enumerating,
            SyncPhase::Fetching {
                chunk: 0,
                chunks: 2,
            },
            SyncPhase::Fetching {
                chunk: 1,
                chunks: 2,
            },
            SyncPhase::Finalizing,
            SyncPhase::Idle,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(&pair[1]),
                "{} -> {} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!SyncPhase::Idle.can_transition_to(&SyncPhase::Enumerating));
        assert!(!SyncPhase::Locked.can_transition_to(&SyncPhase::Finalizing));
        assert!(!SyncPhase::Finalizing.can_transition_to(&SyncPhase::Locked));
    }

    #[test]
    fn test_any_phase_can_abort_to_idle() {
        assert!(SyncPhase::Enumerating.can_transition_to(&SyncPhase::Idle));
        assert!(SyncPhase::Locked.can_transition_to(&SyncPhase::Idle));
    }

    #[test]
    fn test_display() {
        let phase = SyncPhase::Fetching {
            chunk: 2,
            chunks: 10,
        };
        assert_eq!(phase.to_string(), "fetching 3/10");
        assert!(phase.is_active());
        assert!(!SyncPhase::Idle.is_active());
    }
}
