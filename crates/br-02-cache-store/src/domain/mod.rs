//! # Domain Layer
//!
//! Pure data and algorithms of the cache store. No I/O.

pub mod entities;
pub mod errors;
pub mod eviction;
pub mod value_objects;

pub use entities::{BlockSet, Cache, CacheStats, StatusUpdate, SyncStatus};
pub use errors::{KVStoreError, StoreError};
pub use eviction::{entry_size, evict_to_fit, EvictionReport};
pub use value_objects::{keys, StorageConfig, MIB};
