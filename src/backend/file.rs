//! File Backend
//!
//! Durable storage adapter: all entries live in a single JSON object file,
//! loaded and rewritten on each mutation. Entry values are already-serialized
//! strings, so the file is a flat `{"key": "raw value", ...}` map.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::backend::{BackendKind, StorageBackend};
use crate::error::Result;

// == File Backend ==
/// Durable key/value storage persisted to a JSON file on disk.
#[derive(Debug)]
pub struct FileBackend {
    /// Location of the backing file; parent directories are created on write
    path: PathBuf,
}

impl FileBackend {
    /// Creates a file backend at the given path. Nothing is touched on disk
    /// until the first write; a missing file reads as an empty store.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string(entries)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Durable
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }

    fn enumerate(&self) -> Result<Vec<String>> {
        Ok(self.load()?.keys().cloned().collect())
    }
}
