//! # Core Domain Entities
//!
//! Defines the account-level entities used across subsystems.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ProfileParseError;

/// Opaque remote identity (e.g. `did:plc:...`).
pub type Did = String;

/// An account in the authenticated user's follow set.
///
/// Unique by `did`. Replaced wholesale on every full sync.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowedUser {
    /// Remote identity of the followed account.
    pub did: Did,
    /// Current handle.
    pub handle: String,
    /// Display name, if the account has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Avatar reference, if the account has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl FollowedUser {
    /// Create a followed user with only the required fields.
    pub fn new(did: impl Into<Did>, handle: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            handle: handle.into(),
            display_name: None,
            avatar: None,
        }
    }

    /// Builder-style method to set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Credentials of the authenticated identity.
///
/// Opaque to the core beyond `owner_id`, which pins the cache to one identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    /// Bearer token for the graph API.
    pub access_token: String,
    /// Identity the token belongs to.
    pub owner_id: Did,
    /// Handle of the authenticated identity.
    pub handle: String,
    /// Base URL of the identity's service.
    pub api_base_url: String,
}

impl AuthToken {
    pub fn new(
        access_token: impl Into<String>,
        owner_id: impl Into<Did>,
        handle: impl Into<String>,
        api_base_url: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            owner_id: owner_id.into(),
            handle: handle.into(),
            api_base_url: api_base_url.into(),
        }
    }
}

// Keeps the bearer token out of logs.
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("access_token", &"<redacted>")
            .field("owner_id", &self.owner_id)
            .field("handle", &self.handle)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// How per-user block data is persisted.
///
/// One profile is chosen per deployment; a cache built under one profile is
/// never read under the other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageProfile {
    /// Raw block lists. Exact answers, larger footprint.
    #[default]
    Exact,
    /// Bloom-filter compressed lists. Candidates are verified at query time.
    Probabilistic,
}

impl fmt::Display for StorageProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageProfile::Exact => write!(f, "exact"),
            StorageProfile::Probabilistic => write!(f, "probabilistic"),
        }
    }
}

impl FromStr for StorageProfile {
    type Err = ProfileParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(StorageProfile::Exact),
            "probabilistic" | "bloom" => Ok(StorageProfile::Probabilistic),
            other => Err(ProfileParseError(other.to_string())),
        }
    }
}
