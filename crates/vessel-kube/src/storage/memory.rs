//! In-memory store for testing
//!
//! Counts every operation so tests can assert how a service talks to its
//! store without requiring a Kubernetes cluster.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::KeyValueStore;
use crate::error::Result;

/// In-memory key-value store
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<BTreeMap<String, String>>>,
    operations: Arc<RwLock<OperationCounts>>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub gets: usize,
    pub puts: usize,
    pub deletes: usize,
    pub lists: usize,
    pub replaces: usize,
}

impl OperationCounts {
    /// Number of mutating operations
    pub fn writes(&self) -> usize {
        self.puts + self.deletes + self.replaces
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-populated entries
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        {
            let mut data = store.data.write().unwrap_or_else(PoisonError::into_inner);
            for (key, value) in entries {
                data.insert(key.into(), value.into());
            }
        }
        store
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn reset_counts(&self) {
        *self.operations.write().unwrap_or_else(PoisonError::into_inner) =
            OperationCounts::default();
    }

    /// Snapshot of every entry
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.data.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn count(&self, op: impl FnOnce(&mut OperationCounts)) {
        op(&mut *self.operations.write().unwrap_or_else(PoisonError::into_inner));
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.count(|ops| ops.gets += 1);
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(data.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.count(|ops| ops.puts += 1);
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.count(|ops| ops.deletes += 1);
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        Ok(data.remove(key).is_some())
    }

    async fn list_all(&self) -> Result<BTreeMap<String, String>> {
        self.count(|ops| ops.lists += 1);
        Ok(self.entries())
    }

    async fn replace_all(&self, data: BTreeMap<String, String>) -> Result<()> {
        self.count(|ops| ops.replaces += 1);
        *self.data.write().unwrap_or_else(PoisonError::into_inner) = data;
        Ok(())
    }
}
