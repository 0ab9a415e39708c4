use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Identity store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// `add` on a key that already holds a value
    #[error("Key already exists: {0}")]
    AlreadyExists(String),

    #[error("Backup medium error: {0}")]
    Medium(String),
}
