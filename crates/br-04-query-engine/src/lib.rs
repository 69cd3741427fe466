//! # BR-04 Query Engine
//!
//! Answers which followed accounts block a viewed account (`blocked_by`)
//! and which followed accounts the viewed account blocks (`blocking`).
//!
//! ## Lookup Paths
//!
//! | Cache entry | `blocked_by` test |
//! |-------------|-------------------|
//! | Exact block list | Direct membership (binary search above [`QueryConfig::hash_set_threshold`]) |
//! | Bloom filter | `might_contain`, then confirmed against the live block list |
//!
//! `blocking` is tested against the viewed account's own block list, which
//! the caller fetches on demand; it is never cached.
//!
//! The engine only reads the cache and never takes the sync lease. A lookup
//! racing a sync pass sees the last persisted cache.

pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use config::QueryConfig;
pub use domain::{find_blocking, scan_blocked_by, BlockingInfo, CacheScan, MembershipIndex};
pub use error::QueryError;
pub use metrics::{QueryMetrics, QueryMetricsSnapshot};
pub use ports::QueryEngineApi;
pub use service::QueryEngine;
