//! Resilient identity store
//!
//! The primary key-value store holds the local identity (secrets included)
//! but can be wiped by the host outside our control. Entries whose key
//! carries the secret prefix are therefore mirrored into a second,
//! independent medium and can be restored from it.
//!
//! - `traits`: `KeyValueStore` (primary) and `BackupMedium` (secondary)
//! - `memory` / `sqlite`: primary engines
//! - `memory` / `file_medium`: backup media
//! - `resilient`: the mirroring layer and additive restore

pub mod error;
pub mod file_medium;
pub mod memory;
pub mod resilient;
pub mod sqlite;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file_medium::FileMedium;
pub use memory::{MemoryMedium, MemoryStore};
pub use resilient::{RestoreReport, ResilientStore, DEFAULT_SECRET_PREFIX};
pub use sqlite::SqliteStore;
pub use traits::{BackupMedium, KeyValueStore};
