//! # Runtime Configuration
//!
//! Unified configuration for every subsystem plus the runtime's own
//! scheduling and logging parameters.
//!
//! ## Environment Overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `BLOCKRADAR_PROFILE` | `sync.profile` (`exact` / `probabilistic`) |
//! | `BLOCKRADAR_QUOTA_BYTES` | `storage.quota_bytes` |
//! | `BLOCKRADAR_CHUNK_SIZE` | `sync.chunk_size` |
//! | `BLOCKRADAR_SYNC_INTERVAL_SECS` | `scheduler.sync_interval_secs` |
//! | `BLOCKRADAR_DATA_DIR` | `data_dir` |
//! | `BLOCKRADAR_LOG_LEVEL` | `log.level` |
//! | `BLOCKRADAR_LOG_JSON` | `log.json` |
//!
//! Unparsable values are logged and the default is kept.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use br_02_cache_store::StorageConfig;
use br_03_sync_engine::SyncConfig;
use br_04_query_engine::QueryConfig;
use serde::{Deserialize, Serialize};
use shared_types::StorageProfile;
use thiserror::Error;
use tracing::warn;

/// Store directory used when none is configured.
pub const DEFAULT_DATA_DIR: &str = "blockradar-data";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A section failed validation.
    #[error("Invalid {section} configuration: {reason}")]
    Invalid {
        /// Section name (`storage`, `sync`, ...).
        section: &'static str,
        /// What was wrong.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(section: &'static str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            section,
            reason: reason.to_string(),
        }
    }
}

/// Periodic sync schedule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between scheduled passes.
    pub sync_interval_secs: u64,
    /// Run a pass at startup when the cache is missing or incomplete.
    pub sync_on_startup: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sync_interval_secs: 60 * 60,
            sync_on_startup: true,
        }
    }
}

impl SchedulerConfig {
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }
}

/// Log output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete runtime configuration.
#[derive(Clone, Debug, Default)]
pub struct RuntimeConfig {
    /// Storage quota.
    pub storage: StorageConfig,
    /// Sync pass tuning and storage profile.
    pub sync: SyncConfig,
    /// Lookup tuning.
    pub query: QueryConfig,
    /// Periodic schedule.
    pub scheduler: SchedulerConfig,
    /// Log output.
    pub log: LogConfig,
    /// Directory of the file-backed store; `None` uses [`DEFAULT_DATA_DIR`].
    pub data_dir: Option<PathBuf>,
}

impl RuntimeConfig {
    /// Start a builder from defaults.
    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder::default()
    }

    /// Small quotas and no delays.
    pub fn for_testing() -> Self {
        Self {
            storage: StorageConfig::for_testing(),
            sync: SyncConfig::for_testing(),
            query: QueryConfig::default(),
            scheduler: SchedulerConfig::default(),
            log: LogConfig::default(),
            data_dir: None,
        }
    }

    /// Defaults overridden from `BLOCKRADAR_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden from `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(profile) = parsed::<StorageProfile, _>(&lookup, "BLOCKRADAR_PROFILE") {
            builder = builder.profile(profile);
        }
        if let Some(quota) = parsed::<usize, _>(&lookup, "BLOCKRADAR_QUOTA_BYTES") {
            builder = builder.quota_bytes(quota);
        }
        if let Some(chunk) = parsed::<usize, _>(&lookup, "BLOCKRADAR_CHUNK_SIZE") {
            builder = builder.chunk_size(chunk);
        }
        if let Some(secs) = parsed::<u64, _>(&lookup, "BLOCKRADAR_SYNC_INTERVAL_SECS") {
            builder = builder.sync_interval_secs(secs);
        }
        if let Some(dir) = lookup("BLOCKRADAR_DATA_DIR").filter(|d| !d.is_empty()) {
            builder = builder.data_dir(dir);
        }
        if let Some(level) = lookup("BLOCKRADAR_LOG_LEVEL").filter(|l| !l.is_empty()) {
            builder = builder.log_level(level);
        }
        if let Some(json) = lookup("BLOCKRADAR_LOG_JSON") {
            builder = builder.log_json(json.eq_ignore_ascii_case("true") || json == "1");
        }

        builder.build()
    }

    /// Directory of the file-backed store.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.storage
            .validate()
            .map_err(|e| ConfigError::invalid("storage", e))?;
        self.sync
            .validate()
            .map_err(|e| ConfigError::invalid("sync", e))?;
        self.query
            .validate()
            .map_err(|e| ConfigError::invalid("query", e))?;
        if self.scheduler.sync_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "scheduler",
                "sync_interval_secs must be > 0",
            ));
        }
        Ok(())
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "Ignoring unparsable environment value");
            None
        }
    }
}

/// Builder for [`RuntimeConfig`]; `build` validates.
#[derive(Debug, Default)]
pub struct RuntimeConfigBuilder {
    config: RuntimeConfig,
}

impl RuntimeConfigBuilder {
    pub fn storage(mut self, storage: StorageConfig) -> Self {
        self.config.storage = storage;
        self
    }

    pub fn sync(mut self, sync: SyncConfig) -> Self {
        self.config.sync = sync;
        self
    }

    pub fn query(mut self, query: QueryConfig) -> Self {
        self.config.query = query;
        self
    }

    pub fn profile(mut self, profile: StorageProfile) -> Self {
        self.config.sync.profile = profile;
        self
    }

    pub fn quota_bytes(mut self, quota: usize) -> Self {
        self.config.storage.quota_bytes = quota;
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.sync.chunk_size = chunk_size;
        self
    }

    pub fn sync_interval_secs(mut self, secs: u64) -> Self {
        self.config.scheduler.sync_interval_secs = secs;
        self
    }

    pub fn sync_on_startup(mut self, enabled: bool) -> Self {
        self.config.scheduler.sync_on_startup = enabled;
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = Some(dir.into());
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log.level = level.into();
        self
    }

    pub fn log_json(mut self, json: bool) -> Self {
        self.config.log.json = json;
        self
    }

    pub fn build(self) -> Result<RuntimeConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.sync.profile, StorageProfile::Exact);
        assert_eq!(config.storage.quota_bytes, 8 * 1024 * 1024);
        assert_eq!(config.scheduler.sync_interval(), Duration::from_secs(3600));
        assert!(config.data_dir.is_none());
        assert!(!config.log.json);
    }

    #[test]
    fn test_env_overrides() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[
            ("BLOCKRADAR_PROFILE", "probabilistic"),
            ("BLOCKRADAR_QUOTA_BYTES", "1048576"),
            ("BLOCKRADAR_CHUNK_SIZE", "10"),
            ("BLOCKRADAR_SYNC_INTERVAL_SECS", "600"),
            ("BLOCKRADAR_DATA_DIR", "/var/lib/blockradar"),
            ("BLOCKRADAR_LOG_JSON", "true"),
        ]))
        .unwrap();

        assert_eq!(config.sync.profile, StorageProfile::Probabilistic);
        assert_eq!(config.storage.quota_bytes, 1_048_576);
        assert_eq!(config.sync.chunk_size, 10);
        assert_eq!(config.scheduler.sync_interval_secs, 600);
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/blockradar")));
        assert!(config.log.json);
    }

    #[test]
    fn test_unparsable_values_keep_default() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[
            ("BLOCKRADAR_PROFILE", "fuzzy"),
            ("BLOCKRADAR_CHUNK_SIZE", "many"),
        ]))
        .unwrap();

        assert_eq!(config.sync.profile, StorageProfile::Exact);
        assert_eq!(config.sync.chunk_size, SyncConfig::default().chunk_size);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = RuntimeConfig::builder().chunk_size(0).build().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { section: "sync", .. }));

        let err = RuntimeConfig::builder()
            .sync_interval_secs(0)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                section: "scheduler",
                ..
            }
        ));
    }

    #[test]
    fn test_quota_above_hard_limit_rejected() {
        let err = RuntimeConfig::builder()
            .quota_bytes(64 * 1024 * 1024)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                section: "storage",
                ..
            }
        ));
    }
}
