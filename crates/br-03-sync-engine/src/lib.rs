//! # BR-03 Sync Engine
//!
//! Rebuilds the follow-set block index from the remote graph.
//!
//! ## Pass Lifecycle
//!
//! ```text
//! Idle ──lease──→ Locked ──auth + cache──→ Enumerating ──follows──→ Fetching 1..N ──→ Finalizing ──→ Idle
//!   ↑                │                          │
//!   └──── skipped ───┘                          └──── enumeration failed (lease released)
//! ```
//!
//! ## Lease
//!
//! At most one pass runs against a store at a time. The lease is the
//! `running` flag plus `last_heartbeat_at` in the persisted status; every
//! progress update renews it. A holder silent for longer than the stale
//! timeout (5 minutes by default) is presumed dead and its lease is taken
//! over.
//!
//! ## Failure Handling
//!
//! | Failure | Effect |
//! |---------|--------|
//! | Lease busy / not logged in | [`SyncOutcome::Skipped`] |
//! | One user's block list | recorded, previous entry kept, pass continues |
//! | Quota exceeded on persist | largest entries evicted, one retry |
//! | Persist failed after eviction | recorded, pass continues |
//! | Follow enumeration | pass aborted with [`SyncError::Enumeration`] |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Lease protocol, phases, outcomes, errors
//! - `algorithms/` - Follow enumeration and batched block-list fetch
//! - `application/` - [`SyncEngine`], the pass orchestration
//! - `ports/` - [`SyncEngineApi`] inbound port

#![warn(missing_docs)]

pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;

pub use application::SyncEngine;
pub use config::SyncConfig;
pub use domain::{
    is_stale, needs_initial_sync, try_acquire, LeaseDecision, LockState, SkipReason, SyncError,
    SyncOutcome, SyncPhase, SyncReport,
};
pub use metrics::{SyncMetrics, SyncMetricsSnapshot};
pub use ports::SyncEngineApi;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
