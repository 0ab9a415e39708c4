//! Storage abstractions for the resilient identity store

use super::StoreResult;
use async_trait::async_trait;
use serde_json::Value;

/// Primary key-value store.
///
/// Values are arbitrary JSON. `add` is insert-only and must fail with
/// `StoreError::AlreadyExists` when the key is taken, as opposed to `set`
/// which upserts.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    async fn set(&self, key: &str, value: &Value) -> StoreResult<()>;

    async fn add(&self, key: &str, value: &Value) -> StoreResult<()>;

    async fn remove(&self, key: &str) -> StoreResult<()>;

    /// All entries whose key starts with `prefix`, ordered by key.
    async fn entries_with_prefix(&self, prefix: &str) -> StoreResult<Vec<(String, Value)>>;
}

/// Secondary medium mirroring secret entries.
///
/// An ordered, enumerable string store: lower capacity than the primary
/// store but more durable. Any indexable key space satisfies it.
pub trait BackupMedium: Send + Sync {
    /// Number of items in the medium.
    fn len(&self) -> usize;

    /// Key at `index`, or `None` past the end.
    fn key(&self, index: usize) -> Option<String>;

    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;

    fn remove_item(&self, key: &str) -> StoreResult<()>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
