//! JSON file-based storage backend.
//!
//! This module provides a simple, human-readable storage implementation using
//! JSON serialization. It uses atomic file writes (write-to-temp + rename) to
//! prevent corruption on crashes.
//!
//! # Performance Characteristics
//!
//! - **Read**: O(log n) - the whole file is loaded into memory once
//! - **Write**: O(n) - serializes and writes the entire map
//! - **Best for**: a handful of small view-state records

use crate::domain::error::{ReportLensError, Result};
use crate::storage::backend::Storage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// JSON storage container format.
///
/// This is the top-level structure serialized to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StorageData {
    /// Version of the storage format for future migrations.
    version: u32,

    /// Stored values. Each value is itself JSON text owned by the caller.
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

impl Default for StorageData {
    fn default() -> Self {
        Self {
            version: 1,
            entries: BTreeMap::new(),
        }
    }
}

/// JSON file storage backend.
///
/// The entire map is kept in memory and persisted on every modification.
///
/// # Thread Safety
///
/// This type is `Send` but not `Sync`. It's designed to be used from a single
/// worker thread, matching the Zellij plugin architecture.
///
/// # File Format
///
/// ```json
/// {
///   "version": 1,
///   "entries": {
///     "filters": "{\"search\":\"\",\"status\":[\"FAILED\"],\"module\":[],\"buttons\":[]}",
///     "sort": "\"duration_desc\"",
///     "expandedTests": "{\"tests/test_cart.py::test_add\":true}"
///   }
/// }
/// ```
pub struct JsonStorage {
    /// Path to the JSON file on disk.
    file_path: PathBuf,

    /// In-memory data cache, loaded on creation.
    data: StorageData,

    /// Tracks if data has been modified since last save.
    dirty: bool,
}

impl JsonStorage {
    /// Creates or opens a JSON storage backend.
    ///
    /// If the file exists, loads existing data. Otherwise creates a new empty storage.
    /// Parent directories are created automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory creation fails
    /// - File exists but contains invalid JSON
    /// - File permissions prevent reading
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use reportlens::storage::JsonStorage;
    /// use std::path::PathBuf;
    ///
    /// let storage = JsonStorage::new(PathBuf::from("/data/view_state.json"))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(file_path: PathBuf) -> Result<Self> {
        tracing::debug!(path = ?file_path, "initializing JSON storage");

        if let Some(parent) = file_path.parent() {
            tracing::debug!(parent = ?parent, "creating parent directory");
            std::fs::create_dir_all(parent)?;
        }

        let data = if file_path.exists() {
            tracing::debug!("loading existing data");
            Self::load_from_file(&file_path)?
        } else {
            tracing::debug!("initializing new empty storage");
            StorageData::default()
        };

        tracing::debug!(entry_count = data.entries.len(), "storage initialized");

        Ok(Self {
            file_path,
            data,
            dirty: false,
        })
    }

    /// Opens the store, starting empty if the existing file is unreadable.
    ///
    /// A corrupt file is left in place until the first write replaces it.
    ///
    /// # Errors
    ///
    /// Returns an error only if the parent directory cannot be created.
    pub fn open_or_reset(file_path: PathBuf) -> Result<Self> {
        match Self::new(file_path.clone()) {
            Ok(storage) => Ok(storage),
            Err(ReportLensError::Storage(reason)) => {
                tracing::warn!(path = ?file_path, reason = %reason, "discarding unreadable storage file");
                Ok(Self {
                    file_path,
                    data: StorageData::default(),
                    dirty: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Loads storage data from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid JSON.
    fn load_from_file(path: &Path) -> Result<StorageData> {
        let contents = std::fs::read_to_string(path)?;
        let data: StorageData = serde_json::from_str(&contents)
            .map_err(|e| ReportLensError::Storage(format!("failed to parse JSON: {e}")))?;

        tracing::debug!(
            version = data.version,
            entries = data.entries.len(),
            "loaded storage data"
        );

        Ok(data)
    }

    /// Saves storage data to disk using atomic write.
    ///
    /// Writes to a temporary file first, then atomically renames it to the target path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - JSON serialization fails
    /// - Temporary file cannot be written
    /// - Rename operation fails
    fn save_to_file(&mut self) -> Result<()> {
        if !self.dirty {
            tracing::trace!("skipping save, no changes");
            return Ok(());
        }

        tracing::debug!(path = ?self.file_path, "saving storage data");

        let json = serde_json::to_string_pretty(&self.data)
            .map_err(|e| ReportLensError::Storage(format!("failed to serialize JSON: {e}")))?;

        let tmp_path = self.file_path.with_extension("tmp");

        tracing::trace!(tmp_path = ?tmp_path, "writing to temporary file");
        std::fs::write(&tmp_path, json)?;

        tracing::trace!("renaming temporary file to final location");
        std::fs::rename(&tmp_path, &self.file_path)?;

        self.dirty = false;
        tracing::debug!("storage saved successfully");
        Ok(())
    }
}

impl Storage for JsonStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _span = tracing::debug_span!("json_get", key = %key).entered();

        let value = self.data.entries.get(key).cloned();

        tracing::debug!(found = value.is_some(), "lookup complete");
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let _span = tracing::debug_span!("json_set", key = %key, len = value.len()).entered();

        if self.data.entries.get(key).map(String::as_str) == Some(value) {
            tracing::trace!("value unchanged");
            return Ok(());
        }

        self.data.entries.insert(key.to_string(), value.to_string());
        self.dirty = true;
        self.save_to_file()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let _span = tracing::debug_span!("json_remove", key = %key).entered();

        if self.data.entries.remove(key).is_none() {
            tracing::trace!("key absent");
            return Ok(());
        }

        self.dirty = true;
        self.save_to_file()
    }
}

impl Drop for JsonStorage {
    /// Ensures data is saved on drop if an earlier write failed part way.
    fn drop(&mut self) {
        if self.dirty {
            tracing::debug!("saving dirty data on drop");
            if let Err(e) = self.save_to_file() {
                tracing::error!(error = %e, "failed to save on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");

        {
            let mut storage = JsonStorage::new(path.clone()).unwrap();
            storage.set("sort", "\"name_desc\"").unwrap();
            storage.set("filters", "{}").unwrap();
            storage.remove("filters").unwrap();
        }

        let storage = JsonStorage::new(path).unwrap();
        assert_eq!(storage.get("sort").unwrap().as_deref(), Some("\"name_desc\""));
        assert_eq!(storage.get("filters").unwrap(), None);
    }

    #[test]
    fn write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let mut storage = JsonStorage::new(path.clone()).unwrap();
        storage.set("k", "v").unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn corrupt_file_is_an_error_for_new_and_reset_for_open_or_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ this is not json").unwrap();

        assert!(matches!(
            JsonStorage::new(path.clone()),
            Err(ReportLensError::Storage(_))
        ));

        let mut storage = JsonStorage::open_or_reset(path.clone()).unwrap();
        assert_eq!(storage.get("anything").unwrap(), None);
        storage.set("k", "v").unwrap();

        let reopened = JsonStorage::new(path).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn removing_absent_key_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let mut storage = JsonStorage::new(path.clone()).unwrap();
        storage.remove("missing").unwrap();

        assert!(!path.exists());
    }
}
