//! File-backed backup medium
//!
//! Items live in one JSON object on disk, kept in key order. Every change
//! rewrites the file through a temporary sibling that is synced before the
//! rename, and the directory is synced after it, so a crash leaves either the
//! old or the new snapshot. On unix the file is created owner-only (0600)
//! since it holds private seeds.

use super::traits::BackupMedium;
use super::{StoreError, StoreResult};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

pub struct FileMedium {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileMedium {
    /// Open the medium at `path`, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let items = if path.exists() {
            let contents = fs::read(&path)?;
            if contents.is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_slice(&contents)?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn items(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> StoreResult<()> {
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&directory)?;

        let tmp = self.path.with_extension("tmp");
        let mut file = create_private(&tmp)?;
        file.write_all(&serde_json::to_vec_pretty(items)?)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(|e| {
            StoreError::Medium(format!(
                "Failed to replace '{}': {}",
                self.path.display(),
                e
            ))
        })?;
        sync_directory(&directory)
    }

    /// Apply `change` and persist; the in-memory view is rolled back if the
    /// file cannot be written.
    fn update<F>(&self, change: F) -> StoreResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut items = self.items();
        let previous = items.clone();
        change(&mut items);

        if let Err(e) = self.persist(&items) {
            *items = previous;
            return Err(e);
        }
        Ok(())
    }
}

/// Create (or truncate) `path`, owner read/write only on unix.
fn create_private(path: &Path) -> StoreResult<File> {
    // A leftover temp file would keep its old mode
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
        _ => {}
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);
    Ok(options.open(path)?)
}

/// Make the rename durable.
#[cfg(unix)]
fn sync_directory(directory: &Path) -> StoreResult<()> {
    File::open(directory)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_directory(_directory: &Path) -> StoreResult<()> {
    Ok(())
}

impl BackupMedium for FileMedium {
    fn len(&self) -> usize {
        self.items().len()
    }

    fn key(&self, index: usize) -> Option<String> {
        self.items().keys().nth(index).cloned()
    }

    fn get_item(&self, key: &str) -> Option<String> {
        self.items().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.update(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.update(|items| {
            items.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_items_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("backup.json");

        let medium = FileMedium::open(&path).unwrap();
        medium.set_item("ns.session.e2ee:a", "\"one\"").unwrap();
        medium.set_item("ns.session.e2ee:b", "\"two\"").unwrap();
        medium.remove_item("ns.session.e2ee:a").unwrap();
        drop(medium);

        let reopened = FileMedium::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.key(0).as_deref(), Some("ns.session.e2ee:b"));
        assert_eq!(
            reopened.get_item("ns.session.e2ee:b").as_deref(),
            Some("\"two\"")
        );
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let medium = FileMedium::open(temp_dir.path().join("nested/backup.json")).unwrap();
        assert!(medium.is_empty());

        // Parent directory is created on first write
        medium.set_item("k", "v").unwrap();
        assert!(medium.path().exists());
        assert!(!medium.path().with_extension("tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_backup_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("backup.json");
        let medium = FileMedium::open(&path).unwrap();
        medium
            .set_item("ns.session.e2ee:secret.m.cross_signing.master", "\"c2VlZA\"")
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        // Still owner-only after a rewrite replaced the file
        medium.remove_item("ns.session.e2ee:secret.m.cross_signing.master").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }

    #[test]
    fn test_rewrite_leaves_complete_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("backup.json");
        let medium = FileMedium::open(&path).unwrap();
        medium.set_item("a", "1").unwrap();
        medium.set_item("b", "2").unwrap();

        let on_disk: BTreeMap<String, String> =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 2);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_open_corrupt_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("backup.json");
        fs::write(&path, b"not json").unwrap();

        assert!(matches!(
            FileMedium::open(&path),
            Err(StoreError::Serialization(_))
        ));
    }
}
