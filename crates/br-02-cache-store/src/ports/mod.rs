//! # Ports
//!
//! - `outbound`: the key-value persistence boundary

pub mod outbound;

pub use outbound::KeyValueStore;
