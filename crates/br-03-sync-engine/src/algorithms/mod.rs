//! # Algorithms
//!
//! Remote-facing steps of a sync pass.

pub mod enumerate;
pub mod fetch;

pub use enumerate::enumerate_follows;
pub use fetch::{build_entry, describe_failure, fetch_chunk, EntryUpdate, UserFetch};
