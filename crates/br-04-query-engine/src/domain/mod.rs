//! # Domain Layer
//!
//! Lookup results and the pure cache scans behind them.

pub mod entities;
pub mod lookup;
pub mod membership;

pub use entities::{BlockingInfo, CacheScan};
pub use lookup::{find_blocking, scan_blocked_by};
pub use membership::MembershipIndex;
