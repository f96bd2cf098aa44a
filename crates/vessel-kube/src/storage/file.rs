//! File-based store
//!
//! Keeps every entry in one JSON object on disk. Useful for:
//! - Development and testing without a Kubernetes cluster
//! - Offline scenarios

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::KeyValueStore;
use crate::error::{KubeError, Result};

/// Store backed by a single JSON map file
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a file store, creating parent directories as needed
    ///
    /// The file itself is written on the first mutation.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            KubeError::Storage(format!("invalid store file {}: {}", self.path.display(), e))
        })
    }

    fn write_map(&self, data: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.remove(key))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut data = self.read_map()?;
        data.insert(key.to_string(), value.to_string());
        self.write_map(&data)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut data = self.read_map()?;
        let existed = data.remove(key).is_some();
        if existed {
            self.write_map(&data)?;
        }
        Ok(existed)
    }

    async fn list_all(&self) -> Result<BTreeMap<String, String>> {
        self.read_map()
    }

    async fn replace_all(&self, data: BTreeMap<String, String>) -> Result<()> {
        self.write_map(&data)
    }
}
