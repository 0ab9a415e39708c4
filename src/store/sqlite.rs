//! SQLite primary store
//!
//! One `session` table of `(key, value)` rows with JSON-encoded values.

use super::traits::KeyValueStore;
use super::{StoreError, StoreResult};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

const CREATE_SESSION_TABLE: &str = "CREATE TABLE IF NOT EXISTS session (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
)";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    ///
    /// Uses a rollback journal so the database is a single file. The file
    /// holds private seeds and is owner-only on unix.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        restrict_permissions(path.as_ref())?;

        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete);
        Self::connect(options, 4).await
    }

    /// Private in-memory database (single connection so every query sees it).
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        Self::connect(options, 1).await
    }

    async fn connect(options: SqliteConnectOptions, max_connections: u32) -> StoreResult<Self> {
        // An in-memory database lives only as long as its connection
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_SESSION_TABLE).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Delete every row, simulating loss of the primary database.
    pub async fn wipe(&self) -> StoreResult<()> {
        sqlx::query("DELETE FROM session").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Create the database file owner-only, or tighten an existing one.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> StoreResult<()> {
    use std::fs::{OpenOptions, Permissions};
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .mode(0o600)
        .open(path)?;
    std::fs::set_permissions(path, Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> StoreResult<()> {
    Ok(())
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let raw: Option<String> = sqlx::query_scalar("SELECT value FROM session WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        raw.map(|raw| serde_json::from_str(&raw).map_err(StoreError::from))
            .transpose()
    }

    async fn set(&self, key: &str, value: &Value) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO session (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(serde_json::to_string(value)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn add(&self, key: &str, value: &Value) -> StoreResult<()> {
        let result = sqlx::query("INSERT OR IGNORE INTO session (key, value) VALUES (?1, ?2)")
            .bind(key)
            .bind(serde_json::to_string(value)?)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM session WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn entries_with_prefix(&self, prefix: &str) -> StoreResult<Vec<(String, Value)>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT key, value FROM session
             WHERE substr(key, 1, length(?1)) = ?1
             ORDER BY key",
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(key, raw)| -> StoreResult<(String, Value)> {
                Ok((key, serde_json::from_str(&raw)?))
            })
            .collect()
    }
}
