//! # Sync Engine Configuration

use std::time::Duration;

use br_01_bloom_filter::BloomConfig;
use serde::{Deserialize, Serialize};
use shared_types::StorageProfile;

use crate::domain::SyncError;

/// Sync engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Followed users fetched concurrently per chunk.
    pub chunk_size: usize,

    /// Persist the cache every N chunks (and always after the last one).
    pub persist_every_chunks: usize,

    /// Pause between chunks, in milliseconds.
    pub chunk_delay_ms: u64,

    /// Pause between follow-listing pages, in milliseconds.
    pub page_delay_ms: u64,

    /// A running lease whose heartbeat is older than this is reclaimed.
    pub stale_timeout_secs: u64,

    /// Fraction of the cache ceiling above which a pass evicts before fetching.
    pub proactive_eviction_ratio: f64,

    /// How block data is persisted.
    pub profile: StorageProfile,

    /// Cached entries below this fraction of follows marks a cache incomplete.
    pub incomplete_threshold: f64,

    /// Follow count under which the incompleteness check is skipped.
    pub incomplete_min_follows: usize,

    /// Filter sizing for the probabilistic profile.
    pub bloom: BloomConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5,
            persist_every_chunks: 4,
            chunk_delay_ms: 500,
            page_delay_ms: 200,
            stale_timeout_secs: 5 * 60,
            proactive_eviction_ratio: 0.9,
            profile: StorageProfile::Exact,
            incomplete_threshold: 0.05,
            incomplete_min_follows: 20,
            bloom: BloomConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Create a config for testing (no delays).
    pub fn for_testing() -> Self {
        Self {
            chunk_delay_ms: 0,
            page_delay_ms: 0,
            ..Self::default()
        }
    }

    /// Builder-style method to set the storage profile.
    pub fn with_profile(mut self, profile: StorageProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Builder-style method to set the chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Builder-style method to set the persist cadence.
    pub fn with_persist_every(mut self, chunks: usize) -> Self {
        self.persist_every_chunks = chunks;
        self
    }

    /// Pause between chunks.
    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    /// Pause between follow-listing pages.
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    /// Lease staleness timeout.
    pub fn stale_timeout(&self) -> Duration {
        Duration::from_secs(self.stale_timeout_secs)
    }

    /// Validate parameter ranges.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.chunk_size == 0 {
            return Err(SyncError::InvalidConfig(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.persist_every_chunks == 0 {
            return Err(SyncError::InvalidConfig(
                "persist_every_chunks must be greater than 0".to_string(),
            ));
        }
        if self.stale_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "stale_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if !(self.proactive_eviction_ratio > 0.0 && self.proactive_eviction_ratio <= 1.0) {
            return Err(SyncError::InvalidConfig(format!(
                "proactive_eviction_ratio must be in (0, 1], got {}",
                self.proactive_eviction_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.incomplete_threshold) {
            return Err(SyncError::InvalidConfig(format!(
                "incomplete_threshold must be in [0, 1], got {}",
                self.incomplete_threshold
            )));
        }
        self.bloom
            .validate()
            .map_err(|e| SyncError::InvalidConfig(e.to_string()))
    }
}
