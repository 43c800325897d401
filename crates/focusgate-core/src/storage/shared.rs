use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StorageError;

const STORE_FILE: &str = "shared.json";

/// Handle to the shared key-value store file.
///
/// Cheap to clone; every operation re-reads the file so that writes
/// from the other process are always visible.
#[derive(Debug, Clone)]
pub struct SharedStore {
    path: PathBuf,
}

/// Summary of a clear-all-data reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResetSummary {
    pub keys_removed: usize,
    pub confirmed_sessions_removed: usize,
    pub pending_sessions_removed: usize,
    pub reset_at: DateTime<Utc>,
}

impl SharedStore {
    /// Open the store inside the given directory. The backing file is
    /// created lazily on first write.
    pub fn open(dir: &Path) -> Self {
        Self {
            path: dir.join(STORE_FILE),
        }
    }

    /// Open the store in the default data directory.
    pub fn open_default() -> Result<Self, StorageError> {
        Ok(Self::open(&super::data_dir()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a typed value for `key`.
    ///
    /// A missing file or missing key yields `Ok(None)`. A value that
    /// fails to decode is treated as absent and logged as a fault, so a
    /// corrupted record never crashes a caller.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let map = self.read_map()?;
        let Some(value) = map.get(key) else {
            return Ok(None);
        };
        match serde_json::from_value(value.clone()) {
            Ok(decoded) => Ok(Some(decoded)),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding undecodable stored value");
                Ok(None)
            }
        }
    }

    /// Read a typed value, falling back to `T::default()` when absent
    /// or undecodable.
    pub fn get_or_default<T: DeserializeOwned + Default>(
        &self,
        key: &str,
    ) -> Result<T, StorageError> {
        Ok(self.get(key)?.unwrap_or_default())
    }

    /// Write a single key synchronously.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let encoded = serde_json::to_value(value).map_err(|e| StorageError::Decode {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.update(|map| {
            map.insert(key.to_string(), encoded);
        })
    }

    /// Remove a single key. Absent keys are a no-op.
    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|map| {
            map.remove(key);
        })
    }

    /// Read the whole store, apply `f`, and write the result back as
    /// one atomic file replacement. Multi-key mutations that must not
    /// be observed half-applied (ledger merge, clear-all) go through
    /// here.
    pub fn update<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let mut map = self.read_map()?;
        f(&mut map);
        self.write_map(&map)
    }

    /// Remove every key, returning a summary of what was dropped.
    pub fn clear_all(&self) -> Result<DataResetSummary, StorageError> {
        let map = self.read_map()?;
        let confirmed = map
            .get(super::keys::CONFIRMED_FOCUS_SESSIONS)
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0);
        let pending = [
            super::keys::PENDING_FOREGROUND,
            super::keys::PENDING_BACKGROUND,
        ]
        .iter()
        .map(|k| {
            map.get(*k)
                .and_then(Value::as_array)
                .map(Vec::len)
                .unwrap_or(0)
        })
        .sum();

        let summary = DataResetSummary {
            keys_removed: map.len(),
            confirmed_sessions_removed: confirmed,
            pending_sessions_removed: pending,
            reset_at: Utc::now(),
        };
        self.write_map(&Map::new())?;
        Ok(summary)
    }

    fn read_map(&self) -> Result<Map<String, Value>, StorageError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(StorageError::ReadFailed {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        match serde_json::from_str::<Map<String, Value>>(&content) {
            Ok(map) => Ok(map),
            Err(e) => {
                // A corrupted store degrades to empty rather than
                // crashing. The fault is recorded for diagnostics.
                tracing::warn!(path = %self.path.display(), error = %e, "shared store corrupted, starting empty");
                Ok(Map::new())
            }
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), StorageError> {
        let data = serde_json::to_string_pretty(map).map_err(|e| StorageError::Decode {
            key: STORE_FILE.to_string(),
            message: e.to_string(),
        })?;
        let tmp = self.path.with_extension("json.tmp");
        let write_err = |e| StorageError::WriteFailed {
            path: self.path.clone(),
            source: e,
        };
        std::fs::write(&tmp, data).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}
