//! Trait definitions for the pipeline's external collaborators.

use crate::{StateKey, WriteBatch};
use async_trait::async_trait;
use storyloom_core::{EditEvent, GenerateRequest, GenerateResponse};
use storyloom_error::StoryloomResult;
use std::sync::Arc;

/// Core trait that all generation backends must implement.
///
/// Calls are nondeterministic: identical requests may legitimately return
/// different text.
#[async_trait]
pub trait GenerationDriver: Send + Sync {
    /// Generate text for a prompt.
    async fn generate(&self, req: &GenerateRequest) -> StoryloomResult<GenerateResponse>;

    /// Provider name (e.g., "openai", "local-server").
    fn provider_name(&self) -> &'static str;

    /// Model identifier.
    fn model_name(&self) -> &str;
}

/// Source of edit events.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Most recent edits, newest first, as the upstream returns them.
    async fn recent_changes(&self) -> StoryloomResult<Vec<EditEvent>>;

    /// Human-readable feed name for logs.
    fn feed_name(&self) -> &str;
}

/// Durable key-value storage for pipeline state.
///
/// [`KeyValueStore::apply`] must be all-or-nothing: after a crash, readers
/// observe either every operation of a batch or none of them.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: StateKey) -> StoryloomResult<Option<String>>;

    /// Apply every operation of the batch as one logical unit.
    async fn apply(&self, batch: WriteBatch) -> StoryloomResult<()>;

    /// Backend name for logs.
    fn backend_name(&self) -> &'static str;
}

#[async_trait]
impl<T: GenerationDriver + ?Sized> GenerationDriver for Arc<T> {
    async fn generate(&self, req: &GenerateRequest) -> StoryloomResult<GenerateResponse> {
        (**self).generate(req).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

#[async_trait]
impl<T: ChangeFeed + ?Sized> ChangeFeed for Arc<T> {
    async fn recent_changes(&self) -> StoryloomResult<Vec<EditEvent>> {
        (**self).recent_changes().await
    }

    fn feed_name(&self) -> &str {
        (**self).feed_name()
    }
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: StateKey) -> StoryloomResult<Option<String>> {
        (**self).get(key).await
    }

    async fn apply(&self, batch: WriteBatch) -> StoryloomResult<()> {
        (**self).apply(batch).await
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}
