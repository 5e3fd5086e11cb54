//! In-memory implementation of KeyValueStore for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use storyloom_error::StoryloomResult;
use storyloom_interface::{KeyValueStore, StateKey, WriteBatch, WriteOp};
use tokio::sync::RwLock;

/// In-memory key-value store.
///
/// A whole batch is applied under one write lock, so readers never see half
/// of it. All data is lost when the last clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    values: Arc<RwLock<HashMap<StateKey, String>>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored value (for testing).
    pub async fn snapshot(&self) -> HashMap<StateKey, String> {
        self.values.read().await.clone()
    }

    /// Number of stored keys (for testing).
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    /// Check if the store is empty (for testing).
    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: StateKey) -> StoryloomResult<Option<String>> {
        Ok(self.values.read().await.get(&key).cloned())
    }

    async fn apply(&self, batch: WriteBatch) -> StoryloomResult<()> {
        let mut values = self.values.write().await;
        for op in batch.into_ops() {
            match op {
                WriteOp::Put { key, value } => {
                    values.insert(key, value);
                }
                WriteOp::Remove { key } => {
                    values.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
