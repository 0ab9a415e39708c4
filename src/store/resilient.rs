//! Mirrored identity store with additive restore
//!
//! ## Write path
//!
//! Every `set` / `add` / `remove` goes to the primary store first. If the key
//! starts with the secret prefix, the change is then mirrored into the backup
//! medium under `<namespace>.session.<key>`. Mirror failures are logged and
//! swallowed: the primary write has already succeeded and must not be undone
//! by a backup problem.
//!
//! ## Restore path
//!
//! `restore_from_backup` walks the medium's key space, keeps keys carrying the
//! derived prefix, and inserts each value into the primary store with `add`
//! only when the primary store has nothing under that key. The medium is
//! never authoritative: a restore can fill gaps but never overwrite.

use super::traits::{BackupMedium, KeyValueStore};
use super::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Default prefix of keys holding end-to-end identity secrets.
pub const DEFAULT_SECRET_PREFIX: &str = "e2ee:";

/// Outcome of one restore pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreReport {
    /// Medium entries carrying the derived prefix
    pub examined: usize,

    /// Primary keys written from the backup
    pub restored: Vec<String>,

    /// Entries left alone because the primary store already had the key
    pub skipped_existing: usize,

    /// Entries whose backed-up value could not be parsed
    pub unreadable: usize,
}

impl RestoreReport {
    pub fn restored_any(&self) -> bool {
        !self.restored.is_empty()
    }
}

pub struct ResilientStore<S, M> {
    primary: S,
    medium: M,
    namespace: String,
    secret_prefix: String,
}

impl<S: KeyValueStore, M: BackupMedium> ResilientStore<S, M> {
    /// Wrap `primary`, mirroring secret entries into `medium` under
    /// `namespace`.
    pub fn new(primary: S, medium: M, namespace: impl Into<String>) -> Self {
        Self {
            primary,
            medium,
            namespace: namespace.into(),
            secret_prefix: DEFAULT_SECRET_PREFIX.to_string(),
        }
    }

    pub fn with_secret_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.secret_prefix = prefix.into();
        self
    }

    pub fn primary(&self) -> &S {
        &self.primary
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    pub fn secret_prefix(&self) -> &str {
        &self.secret_prefix
    }

    /// Whether `key` is mirrored into the backup medium.
    pub fn is_secret_key(&self, key: &str) -> bool {
        key.starts_with(&self.secret_prefix)
    }

    fn backup_prefix(&self) -> String {
        format!("{}.session.", self.namespace)
    }

    /// Medium key for primary key `key`.
    pub fn backup_key(&self, key: &str) -> String {
        format!("{}{}", self.backup_prefix(), key)
    }

    pub async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        self.primary.get(key).await
    }

    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.primary.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Upsert `value` under `key`.
    pub async fn set<T>(&self, key: &str, value: &T) -> StoreResult<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let value = serde_json::to_value(value)?;
        self.primary.set(key, &value).await?;
        if self.is_secret_key(key) {
            self.mirror(key, &value);
        }
        Ok(())
    }

    /// Insert `value` under `key`; fails with `AlreadyExists` if taken.
    pub async fn add<T>(&self, key: &str, value: &T) -> StoreResult<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let value = serde_json::to_value(value)?;
        self.primary.add(key, &value).await?;
        if self.is_secret_key(key) {
            self.mirror(key, &value);
        }
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> StoreResult<()> {
        self.primary.remove(key).await?;
        if self.is_secret_key(key) {
            if let Err(e) = self.medium.remove_item(&self.backup_key(key)) {
                warn!(%key, error = %e, "failed to remove backup entry");
            }
        }
        Ok(())
    }

    fn mirror(&self, key: &str, value: &Value) {
        let result = serde_json::to_string(value)
            .map_err(StoreError::from)
            .and_then(|raw| self.medium.set_item(&self.backup_key(key), &raw));

        match result {
            Ok(()) => debug!(%key, "mirrored entry to backup medium"),
            Err(e) => warn!(%key, error = %e, "failed to mirror entry to backup medium"),
        }
    }

    /// Force-mirror every secret entry of the primary store.
    ///
    /// Used after bulk imports that bypassed `set`. Returns the number of
    /// entries written to the medium.
    pub async fn write_backup(&self) -> StoreResult<usize> {
        let entries = self.primary.entries_with_prefix(&self.secret_prefix).await?;
        let mut written = 0;

        for (key, value) in &entries {
            let result = serde_json::to_string(value)
                .map_err(StoreError::from)
                .and_then(|raw| self.medium.set_item(&self.backup_key(key), &raw));
            match result {
                Ok(()) => written += 1,
                Err(e) => warn!(%key, error = %e, "failed to write backup entry"),
            }
        }

        info!(written, total = entries.len(), "wrote identity backup");
        Ok(written)
    }

    /// Refill missing primary entries from the medium.
    ///
    /// Returns whether at least one entry was restored.
    pub async fn restore_from_backup(&self) -> StoreResult<bool> {
        Ok(self.restore_with_report().await?.restored_any())
    }

    pub async fn restore_with_report(&self) -> StoreResult<RestoreReport> {
        let prefix = self.backup_prefix();
        let backup_keys: Vec<String> = (0..self.medium.len())
            .filter_map(|index| self.medium.key(index))
            .filter(|backup_key| backup_key.starts_with(&prefix))
            .collect();

        let mut report = RestoreReport::default();

        for backup_key in &backup_keys {
            let key = &backup_key[prefix.len()..];
            report.examined += 1;

            let Some(raw) = self.medium.get_item(backup_key) else {
                continue;
            };
            let value: Value = match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    warn!(%key, error = %e, "unreadable backup entry");
                    report.unreadable += 1;
                    continue;
                }
            };

            if self.primary.get(key).await?.is_some() {
                debug!(%key, restored = false, "primary store already has entry");
                report.skipped_existing += 1;
                continue;
            }

            match self.primary.add(key, &value).await {
                Ok(()) => {
                    info!(%key, restored = true, "restored entry from backup");
                    report.restored.push(key.to_string());
                }
                Err(StoreError::AlreadyExists(_)) => {
                    debug!(%key, restored = false, "entry appeared during restore");
                    report.skipped_existing += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            examined = report.examined,
            restored = report.restored.len(),
            skipped = report.skipped_existing,
            "identity restore finished"
        );
        Ok(report)
    }
}
