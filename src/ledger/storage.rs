//! Durable client-side key/value storage.
//!
//! The ledger is kept under a fixed key in a small string store that
//! survives restarts. Reads and writes are synchronous; payloads are tiny.

use crate::config::get_config_dir;
use crate::error::{Error, Result};
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the on-disk key/value store.
const STORAGE_FILE_NAME: &str = "local_storage.json";

/// Temporary file used during atomic writes.
const STORAGE_TEMP_NAME: &str = "local_storage.json.tmp";

/// A string key/value store that outlives the session.
pub trait DurableStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory storage
// ─────────────────────────────────────────────────────────────────────────────

/// Ephemeral storage, for tests and sessions without a config directory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_item(mut self, key: &str, value: &str) -> Self {
        self.items.insert(key.to_string(), value.to_string());
        self
    }
}

impl DurableStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File-backed storage
// ─────────────────────────────────────────────────────────────────────────────

/// Storage backed by a JSON object file (`{"key": "value", ...}`).
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage file in the per-user configuration directory.
    pub fn in_config_dir() -> Result<Self> {
        Ok(Self::new(get_config_dir()?.join(STORAGE_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| Error::StorageLoad {
            path: self.path.clone(),
            source: Box::new(e),
        })?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|e| Error::StorageLoad {
            path: self.path.clone(),
            source: Box::new(e),
        })
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        let save_err = |e: Box<dyn std::error::Error + Send + Sync>| Error::StorageSave {
            path: self.path.clone(),
            source: e,
        };

        if let Some(dir) = self.path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| save_err(Box::new(e)))?;
            }
        }

        let json = serde_json::to_string_pretty(map).map_err(|e| save_err(Box::new(e)))?;
        let temp_path = self.path.with_file_name(STORAGE_TEMP_NAME);
        fs::write(&temp_path, json).map_err(|e| save_err(Box::new(e)))?;
        fs::rename(&temp_path, &self.path).map_err(|e| save_err(Box::new(e)))?;
        Ok(())
    }
}

impl DurableStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.remove(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)?;
        debug!("Stored '{}' in {}", key, self.path.display());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
