use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{check_quota, record_size, KeyValueStore};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const RECORD_EXTENSION: &str = "json";

/// File-backed key-value store.
///
/// Each record lives in `<dir>/<key>.json`. Writes go to a temp file that is
/// fsynced and renamed over the record, so a kill mid-write leaves either the
/// old or the new value. Records are mirrored in memory after `open`.
pub struct FileKVStore {
    dir: PathBuf,
    data: HashMap<String, String>,
    quota: Option<usize>,
}

impl FileKVStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open<P: AsRef<Path>>(dir: P, quota: Option<usize>) -> Result<Self, KVStoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let mut data = HashMap::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match fs::read_to_string(&path) {
                Ok(value) => {
                    data.insert(key.to_string(), value);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable record");
                }
            }
        }

        tracing::info!(
            dir = %dir.display(),
            records = data.len(),
            "Opened file-backed store"
        );

        Ok(Self { dir, data, quota })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> Result<PathBuf, KVStoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(KVStoreError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.dir.join(format!("{key}.{RECORD_EXTENSION}")))
    }

    fn write_atomically(path: &Path, value: &str) -> Result<(), KVStoreError> {
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}

impl KeyValueStore for FileKVStore {
    fn get(&self, key: &str) -> Result<Option<String>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), KVStoreError> {
        let path = self.record_path(key)?;
        check_quota(self.used_bytes(), self.size_of(key), key, value, self.quota)?;
        Self::write_atomically(&path, value)?;
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), KVStoreError> {
        let path = self.record_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.data.remove(key);
        Ok(())
    }

    fn size_of(&self, key: &str) -> usize {
        self.data.get(key).map(|v| record_size(key, v)).unwrap_or(0)
    }

    fn used_bytes(&self) -> usize {
        self.data.iter().map(|(k, v)| record_size(k, v)).sum()
    }

    fn quota_bytes(&self) -> Option<usize> {
        self.quota
    }
}
