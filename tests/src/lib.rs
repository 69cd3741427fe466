//! # BlockRadar Test Suite
//!
//! Cross-subsystem scenarios that run the real store, sync engine and query
//! engine together against an in-memory graph.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs     # Shared fixture wiring the subsystems
//!     ├── scenarios.rs   # Lookup, failure, lease and quota scenarios
//!     └── runtime.rs     # Request envelope and file-backed restarts
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p br-tests
//! cargo test -p br-tests integration::scenarios::
//! ```

pub mod integration;
