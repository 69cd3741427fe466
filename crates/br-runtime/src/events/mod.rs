//! # Inbound Envelope
//!
//! Requests from the calling surface and the responses they get, as tagged
//! JSON objects:
//!
//! ```text
//! {"type":"getBlockingInfo","profileId":"did:plc:abc"}
//! {"type":"ok","data":{"blockedBy":[...],"blocking":[...],"lastFullSyncAt":...}}
//! {"type":"error","code":-32001,"message":"..."}
//! ```

pub mod requests;
pub mod responses;

pub use requests::Request;
pub use responses::{AuthAck, Response, SyncStatusView, TriggerAck};
