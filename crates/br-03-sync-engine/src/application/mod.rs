//! # Application Layer
//!
//! The sync pass orchestration.

pub mod service;

pub use service::SyncEngine;
