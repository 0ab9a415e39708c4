use super::config::CrossTrustConfig;
use super::open_store;

/// Refill missing secret entries of the identity store from the backup file
pub async fn execute(config: &CrossTrustConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config).await?;
    let report = store.restore_with_report().await?;
    store.primary().close().await;

    if report.restored_any() {
        let count = report.restored.len();
        println!("✅ Restored {} entr{}", count, if count == 1 { "y" } else { "ies" });
        for key in &report.restored {
            println!("  {}", key);
        }
    } else {
        println!("Nothing to restore");
    }
    println!(
        "  Examined: {}, already present: {}, unreadable: {}",
        report.examined, report.skipped_existing, report.unreadable
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosstrust::store::{BackupMedium, FileMedium, KeyValueStore};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_restore_after_database_loss() {
        let temp_dir = TempDir::new().unwrap();
        let config = CrossTrustConfig::new("@me:hs", "DEV", temp_dir.path());

        let store = open_store(&config).await.unwrap();
        store
            .set("e2ee:secret.m.cross_signing.master", "AAAA")
            .await
            .unwrap();
        store.primary().close().await;
        std::fs::remove_file(&config.store.database_path).unwrap();

        execute(&config).await.unwrap();

        let store = open_store(&config).await.unwrap();
        assert_eq!(
            store
                .primary()
                .get("e2ee:secret.m.cross_signing.master")
                .await
                .unwrap(),
            Some(serde_json::json!("AAAA"))
        );
        assert_eq!(FileMedium::open(&config.store.backup_path).unwrap().len(), 1);
    }
}
