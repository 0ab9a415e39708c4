// Integration tests for identity store recovery
//
// These tests verify, against the on-disk SQLite store and JSON backup file:
// - Secret entries survive loss of the primary database
// - Non-secret entries are not mirrored and do not come back
// - Restore never overwrites what the primary store already holds
// - A restored identity re-establishes self-trust

use crosstrust::keys::KeyUsage;
use crosstrust::network::{MockKeyServer, StaticDevice};
use crosstrust::secrets::{secret_store_key, StoreSecretReader};
use crosstrust::store::{
    BackupMedium, FileMedium, KeyValueStore, ResilientStore, SqliteStore, DEFAULT_SECRET_PREFIX,
};
use crosstrust::trust::{CrossSigning, IdentityFixture, OwnIdentity};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

type DiskStore = ResilientStore<SqliteStore, FileMedium>;

async fn open(dir: &Path) -> DiskStore {
    let primary = SqliteStore::open(dir.join("identity.db")).await.unwrap();
    let medium = FileMedium::open(dir.join("backup.json")).unwrap();
    ResilientStore::new(primary, medium, "hydrogen")
}

#[tokio::test]
async fn test_secret_survives_database_loss() {
    let temp_dir = TempDir::new().unwrap();

    let store = open(temp_dir.path()).await;
    store
        .set("e2ee:olmAccount", &json!({"pickle": "abc"}))
        .await
        .unwrap();
    store.set("syncToken", &json!("s100")).await.unwrap();
    store.primary().close().await;

    // The host evicts the database
    std::fs::remove_file(temp_dir.path().join("identity.db")).unwrap();

    let store = open(temp_dir.path()).await;
    assert_eq!(store.get("e2ee:olmAccount").await.unwrap(), None);

    assert!(store.restore_from_backup().await.unwrap());
    assert_eq!(
        store.get("e2ee:olmAccount").await.unwrap(),
        Some(json!({"pickle": "abc"}))
    );
    assert_eq!(store.get("syncToken").await.unwrap(), None);
}

#[tokio::test]
async fn test_wiped_rows_are_restored() {
    let temp_dir = TempDir::new().unwrap();
    let store = open(temp_dir.path()).await;

    store.set("e2ee:a", &1).await.unwrap();
    store.set("e2ee:b", &2).await.unwrap();
    store.primary().wipe().await.unwrap();

    let report = store.restore_with_report().await.unwrap();
    assert_eq!(report.examined, 2);
    assert_eq!(report.restored.len(), 2);
    assert_eq!(store.get("e2ee:b").await.unwrap(), Some(json!(2)));

    // A second pass finds nothing missing
    let report = store.restore_with_report().await.unwrap();
    assert!(!report.restored_any());
    assert_eq!(report.skipped_existing, 2);
}

#[tokio::test]
async fn test_restore_never_overwrites_primary() {
    let temp_dir = TempDir::new().unwrap();
    let store = open(temp_dir.path()).await;

    store.medium().set_item("hydrogen.session.e2ee:K", "\"new\"").unwrap();
    store.primary().set("e2ee:K", &json!("old")).await.unwrap();

    assert!(!store.restore_from_backup().await.unwrap());
    assert_eq!(store.get("e2ee:K").await.unwrap(), Some(json!("old")));
}

#[tokio::test]
async fn test_backup_file_is_reopened() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = open(temp_dir.path()).await;
        store.set("e2ee:k", "v").await.unwrap();
        store.remove("e2ee:gone").await.unwrap();
        store.primary().close().await;
    }

    let medium = FileMedium::open(temp_dir.path().join("backup.json")).unwrap();
    assert_eq!(medium.len(), 1);
    assert_eq!(medium.key(0).as_deref(), Some("hydrogen.session.e2ee:k"));
    assert_eq!(medium.get_item("hydrogen.session.e2ee:k").as_deref(), Some("\"v\""));
}

#[tokio::test]
async fn test_restored_identity_is_trusted_again() {
    let temp_dir = TempDir::new().unwrap();
    let alice = IdentityFixture::new("@alice:example.org", 1);
    let server = MockKeyServer::new();
    alice.publish(&server).unwrap();

    let store = Arc::new(open(temp_dir.path()).await);
    let reader = StoreSecretReader::new(store.clone());
    for usage in KeyUsage::ALL {
        reader
            .store_secret(&usage.secret_name(), &alice.seed_base64(usage))
            .await
            .unwrap();
    }
    assert_eq!(store.medium().len(), 3);

    store.primary().wipe().await.unwrap();
    let master_key = secret_store_key(DEFAULT_SECRET_PREFIX, "m.cross_signing.master");
    assert_eq!(store.primary().get(&master_key).await.unwrap(), None);

    let own = OwnIdentity::new(&alice.user_id, "ALICEDEV");
    let device = StaticDevice::new(alice.device("ALICEDEV").unwrap());
    let engine = CrossSigning::load(
        own.clone(),
        StoreSecretReader::new(store.clone()),
        server.clone(),
        device.clone(),
    )
    .await;
    assert!(!engine.is_master_key_trusted());

    assert!(store.restore_from_backup().await.unwrap());
    let engine = CrossSigning::load(own, StoreSecretReader::new(store), server, device).await;
    assert!(engine.is_master_key_trusted());
}
