//! # BlockRadar Runtime
//!
//! Wires the subsystems into one running instance and answers the inbound
//! request envelope.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    BlockRadarRuntime                         │
//! │                                                              │
//! │  Request ──→ BlockRadarService ──→ QueryEngine ──┐           │
//! │                    │                             │           │
//! │                    ├──→ SyncEngine ──────────────┼→ CacheStore
//! │                    │        ↑                    │           │
//! │                    └─ SyncTrigger ──→ Scheduler ─┘           │
//! │                                   (startup, interval)        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! | Request | Effect |
//! |---------|--------|
//! | `triggerSync` | run a pass now, answer its outcome |
//! | `getBlockingInfo` | answer from the cache, verifying probabilistic hits |
//! | `getSyncStatus` | status record, cache statistics, metrics |
//! | `clearCache` | drop cache and status, queue a pass |
//! | `setAuth` | store the token, queue a pass for a new identity |

pub mod config;
pub mod error;
pub mod events;
pub mod handler;
pub mod runtime;
pub mod scheduler;
pub mod tracing_setup;

pub use config::{
    ConfigError, LogConfig, RuntimeConfig, RuntimeConfigBuilder, SchedulerConfig,
    DEFAULT_DATA_DIR,
};
pub use error::{codes, RuntimeError};
pub use events::{AuthAck, Request, Response, SyncStatusView, TriggerAck};
pub use handler::BlockRadarService;
pub use runtime::BlockRadarRuntime;
pub use scheduler::{Scheduler, SyncTrigger};
pub use tracing_setup::init_tracing;
