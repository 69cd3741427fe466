//! # Shared Types Crate
//!
//! This crate contains the data model shared by every BlockRadar subsystem
//! and the outbound port to the remote social graph.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Opaque identities**: account identifiers (`Did`) are never parsed by
//!   the core; they are compared byte-for-byte.
//! - **Excluded I/O**: the real graph client (pagination transport, retry with
//!   backoff, session resolution) lives outside the workspace. Only its
//!   contract, `GraphApi`, and an in-memory double are defined here.

pub mod entities;
pub mod errors;
pub mod graph;
pub mod time;

pub use entities::*;
pub use errors::*;
pub use graph::{
    fetch_block_list, BlockRecord, BlockRecordsPage, FollowsPage, GraphApi, InMemoryGraph,
};
pub use time::{ManualClock, SystemTimeSource, TimeSource, Timestamp};
