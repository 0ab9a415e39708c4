//! Secret readers
//!
//! The trust engine never holds private seeds beyond one call. It asks a
//! `SecretReader` for the base64 seed of `m.cross_signing.<usage>` each time
//! it needs one. Readers return `None` for missing secrets and for storage
//! failures alike, so a broken store can only make the engine refuse to
//! trust or sign.

use crate::store::{BackupMedium, KeyValueStore, ResilientStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::warn;
use zeroize::Zeroizing;

/// Source of private seeds by logical secret name.
#[async_trait]
pub trait SecretReader: Send + Sync {
    /// Base64-encoded secret named `name`, or `None` if unavailable.
    async fn read_secret(&self, name: &str) -> Option<Zeroizing<String>>;
}

#[async_trait]
impl<T: SecretReader + ?Sized> SecretReader for Arc<T> {
    async fn read_secret(&self, name: &str) -> Option<Zeroizing<String>> {
        (**self).read_secret(name).await
    }
}

/// In-memory secret reader for tests and embedding.
#[derive(Default)]
pub struct MemorySecretReader {
    secrets: Mutex<HashMap<String, Zeroizing<String>>>,
    reads: AtomicUsize,
}

impl MemorySecretReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: impl Into<String>, base64: impl Into<String>) {
        self.secrets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.into(), Zeroizing::new(base64.into()));
    }

    pub fn remove(&self, name: &str) {
        self.secrets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(name);
    }

    /// Number of `read_secret` calls so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretReader for MemorySecretReader {
    async fn read_secret(&self, name: &str) -> Option<Zeroizing<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.secrets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned()
    }
}

/// Store key holding the cached secret `name`.
pub fn secret_store_key(secret_prefix: &str, name: &str) -> String {
    format!("{secret_prefix}secret.{name}")
}

/// Secret reader over the resilient identity store.
///
/// Secrets are cached under `<secret prefix>secret.<name>`, so they are
/// mirrored into the backup medium like every other identity secret.
pub struct StoreSecretReader<S, M> {
    store: Arc<ResilientStore<S, M>>,
}

impl<S: KeyValueStore, M: BackupMedium> StoreSecretReader<S, M> {
    pub fn new(store: Arc<ResilientStore<S, M>>) -> Self {
        Self { store }
    }

    fn key_for(&self, name: &str) -> String {
        secret_store_key(self.store.secret_prefix(), name)
    }

    /// Cache `base64` as secret `name`.
    pub async fn store_secret(&self, name: &str, base64: &str) -> crate::store::StoreResult<()> {
        self.store.set(&self.key_for(name), base64).await
    }
}

#[async_trait]
impl<S: KeyValueStore, M: BackupMedium> SecretReader for StoreSecretReader<S, M> {
    async fn read_secret(&self, name: &str) -> Option<Zeroizing<String>> {
        match self.store.get_as::<String>(&self.key_for(name)).await {
            Ok(secret) => secret.map(Zeroizing::new),
            Err(e) => {
                warn!(secret = %name, error = %e, "failed to read cached secret");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryMedium, MemoryStore};

    #[tokio::test]
    async fn test_memory_reader() {
        let reader = MemorySecretReader::new();
        assert!(reader.read_secret("m.cross_signing.master").await.is_none());

        reader.insert("m.cross_signing.master", "c2VlZA");
        let secret = reader.read_secret("m.cross_signing.master").await.unwrap();
        assert_eq!(secret.as_str(), "c2VlZA");
        assert_eq!(reader.reads(), 2);

        reader.remove("m.cross_signing.master");
        assert!(reader.read_secret("m.cross_signing.master").await.is_none());
    }

    #[tokio::test]
    async fn test_store_reader_mirrors_secrets() {
        let store = Arc::new(ResilientStore::new(
            MemoryStore::new(),
            MemoryMedium::new(),
            "app",
        ));
        let reader = StoreSecretReader::new(store.clone());

        reader
            .store_secret("m.cross_signing.self_signing", "AAAA")
            .await
            .unwrap();

        let secret = reader
            .read_secret("m.cross_signing.self_signing")
            .await
            .unwrap();
        assert_eq!(secret.as_str(), "AAAA");
        assert!(store
            .medium()
            .get_item("app.session.e2ee:secret.m.cross_signing.self_signing")
            .is_some());
    }

    #[tokio::test]
    async fn test_store_reader_wrong_type_is_absent() {
        let store = Arc::new(ResilientStore::new(
            MemoryStore::new(),
            MemoryMedium::new(),
            "app",
        ));
        store
            .set("e2ee:secret.m.cross_signing.master", &serde_json::json!({"not": "a string"}))
            .await
            .unwrap();

        let reader = StoreSecretReader::new(store);
        assert!(reader.read_secret("m.cross_signing.master").await.is_none());
    }
}
