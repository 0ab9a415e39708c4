//! In-memory primary store and backup medium

use super::traits::{BackupMedium, KeyValueStore};
use super::{StoreError, StoreResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory primary store.
///
/// `clear()` drops every entry, simulating the host evicting the primary
/// database.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        locked(&self.entries).clear();
    }

    pub fn len(&self) -> usize {
        locked(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(locked(&self.entries).get(key).cloned())
    }

    async fn set(&self, key: &str, value: &Value) -> StoreResult<()> {
        locked(&self.entries).insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn add(&self, key: &str, value: &Value) -> StoreResult<()> {
        let mut entries = locked(&self.entries);
        if entries.contains_key(key) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        locked(&self.entries).remove(key);
        Ok(())
    }

    async fn entries_with_prefix(&self, prefix: &str) -> StoreResult<Vec<(String, Value)>> {
        Ok(locked(&self.entries)
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}

/// In-memory backup medium.
///
/// `fail_writes(true)` makes every `set_item`/`remove_item` fail, for
/// exercising mirror failure handling.
#[derive(Default)]
pub struct MemoryMedium {
    items: Mutex<BTreeMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        locked(&self.items).clear();
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Medium("medium is not writable".to_string()));
        }
        Ok(())
    }
}

impl BackupMedium for MemoryMedium {
    fn len(&self) -> usize {
        locked(&self.items).len()
    }

    fn key(&self, index: usize) -> Option<String> {
        locked(&self.items).keys().nth(index).cloned()
    }

    fn get_item(&self, key: &str) -> Option<String> {
        locked(&self.items).get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.check_writable()?;
        locked(&self.items).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.check_writable()?;
        locked(&self.items).remove(key);
        Ok(())
    }
}
