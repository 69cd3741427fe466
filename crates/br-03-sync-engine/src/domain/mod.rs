//! # Domain Layer
//!
//! Lease protocol, pass phases, outcomes and errors of the sync engine.

pub mod errors;
pub mod initial;
pub mod lease;
pub mod phase;
pub mod report;

pub use errors::SyncError;
pub use initial::needs_initial_sync;
pub use lease::{is_stale, try_acquire, LeaseDecision, LockState};
pub use phase::SyncPhase;
pub use report::{SkipReason, SyncOutcome, SyncReport};
