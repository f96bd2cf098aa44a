//! Key-value stores for auxiliary specs
//!
//! Vessel keeps small documents (redaction rules) under string keys:
//! - **ConfigMap** (default): one ConfigMap per namespace, one data key per entry
//! - **File**: a single JSON map on disk, for offline use
//! - **Memory**: in-process map with operation counts, for tests

mod configmap;
mod file;
mod memory;

pub use configmap::ConfigMapStore;
pub use file::FileStore;
pub use memory::{MemoryStore, OperationCounts};

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::Result;

/// Name of the ConfigMap holding redactors
pub const REDACT_CONFIGMAP_NAME: &str = "vessel-redact";

/// Label marking objects managed by vessel
pub const MANAGED_LABEL: &str = "vessel.io/managed";

/// String-keyed document store
///
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite `key`
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Every entry, ordered by key
    async fn list_all(&self) -> Result<BTreeMap<String, String>>;

    /// Replace the whole content in one write
    async fn replace_all(&self, data: BTreeMap<String, String>) -> Result<()>;

    /// Check if a key exists
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        (**self).put(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        (**self).delete(key).await
    }

    async fn list_all(&self) -> Result<BTreeMap<String, String>> {
        (**self).list_all().await
    }

    async fn replace_all(&self, data: BTreeMap<String, String>) -> Result<()> {
        (**self).replace_all(data).await
    }
}

/// Labels applied to stores created in the cluster
pub fn managed_labels() -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(MANAGED_LABEL.to_string(), "true".to_string());
    labels.insert(
        "app.kubernetes.io/managed-by".to_string(),
        "vessel".to_string(),
    );
    labels
}
