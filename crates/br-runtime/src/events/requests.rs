use serde::{Deserialize, Serialize};
use shared_types::{AuthToken, Did};

/// Inbound request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    /// Run a sync pass now and report its outcome.
    TriggerSync,
    /// Block relationships between the follow set and one account.
    GetBlockingInfo {
        /// The viewed account.
        profile_id: Did,
    },
    /// Progress, lease state, cache size and counters.
    GetSyncStatus,
    /// Drop the cache and status, then queue a fresh pass.
    ClearCache,
    /// Store the session of the logged-in identity.
    SetAuth {
        /// The session token.
        token: AuthToken,
    },
}

impl Request {
    /// Name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Request::TriggerSync => "triggerSync",
            Request::GetBlockingInfo { .. } => "getBlockingInfo",
            Request::GetSyncStatus => "getSyncStatus",
            Request::ClearCache => "clearCache",
            Request::SetAuth { .. } => "setAuth",
        }
    }
}
