use br_02_cache_store::{CacheStats, SyncStatus};
use br_03_sync_engine::{SyncMetricsSnapshot, SyncPhase};
use br_04_query_engine::QueryMetricsSnapshot;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{codes, RuntimeError};

/// Success/error envelope returned for every request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Response {
    Ok { data: serde_json::Value },
    Error { code: i32, message: String },
}

impl Response {
    /// Wrap a serializable payload.
    pub fn ok<T: Serialize>(data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Response::Ok { data },
            Err(e) => Response::Error {
                code: codes::INTERNAL_ERROR,
                message: format!("Failed to encode response: {e}"),
            },
        }
    }

    pub fn error(err: &RuntimeError) -> Self {
        Response::Error {
            code: err.code(),
            message: err.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok { .. })
    }

    /// Decode the payload of an `Ok` response.
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<T> {
        match self {
            Response::Ok { data } => serde_json::from_value(data.clone()).ok(),
            Response::Error { .. } => None,
        }
    }

    /// Error code of an `Error` response.
    pub fn error_code(&self) -> Option<i32> {
        match self {
            Response::Error { code, .. } => Some(*code),
            Response::Ok { .. } => None,
        }
    }
}

/// Payload of `getSyncStatus`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusView {
    /// Persisted progress and lease record.
    pub status: SyncStatus,
    /// Size and shape of the persisted cache.
    pub cache: CacheStats,
    /// Phase of the pass running in this process.
    pub phase: SyncPhase,
    pub sync_metrics: SyncMetricsSnapshot,
    pub query_metrics: QueryMetricsSnapshot,
}

/// Payload of requests that queue a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerAck {
    /// False if no scheduler was listening.
    pub queued: bool,
}

/// Payload of `setAuth`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthAck {
    /// The token belongs to another identity than the stored one; the old
    /// cache and status were dropped.
    pub identity_changed: bool,
    /// A pass was queued for the new identity.
    pub sync_queued: bool,
}
