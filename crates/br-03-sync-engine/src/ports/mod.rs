//! # Ports
//!
//! - `inbound`: what callers drive the engine with
//! - outbound: the remote graph ([`shared_types::GraphApi`]) and the cache
//!   store ([`br_02_cache_store::KeyValueStore`]), defined in their own crates

pub mod inbound;

pub use inbound::SyncEngineApi;
pub use shared_types::GraphApi;
