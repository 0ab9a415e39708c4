use super::config::CrossTrustConfig;
use super::open_store;

/// Mirror every secret entry of the identity store into the backup file
pub async fn execute(config: &CrossTrustConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config).await?;
    let written = store.write_backup().await?;
    store.primary().close().await;

    println!(
        "✅ Wrote {} backup entr{} to {}",
        written,
        if written == 1 { "y" } else { "ies" },
        config.store.backup_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosstrust::store::{BackupMedium, FileMedium, KeyValueStore};
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_backup_execute() {
        let temp_dir = TempDir::new().unwrap();
        let config = CrossTrustConfig::new("@me:hs", "DEV", temp_dir.path());

        // Written straight to the primary store, so not yet mirrored
        let store = open_store(&config).await.unwrap();
        store
            .primary()
            .set("e2ee:secret.m.cross_signing.master", &json!("AAAA"))
            .await
            .unwrap();
        store.primary().set("settings.theme", &json!("dark")).await.unwrap();
        store.primary().close().await;

        execute(&config).await.unwrap();
        let medium = FileMedium::open(&config.store.backup_path).unwrap();
        assert_eq!(medium.len(), 1);
    }
}
