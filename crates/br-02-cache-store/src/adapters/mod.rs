//! # Adapters
//!
//! Implementations of [`crate::ports::KeyValueStore`].

pub mod storage;

pub use storage::{FileKVStore, InMemoryKVStore};
