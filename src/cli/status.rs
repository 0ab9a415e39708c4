use super::config::CrossTrustConfig;
use super::{open_store, IdentityStore};
use crosstrust::crypto::{derive_public_key, SigningSeed};
use crosstrust::keys::KeyUsage;
use crosstrust::secrets::{SecretReader, StoreSecretReader};
use crosstrust::store::{BackupMedium, KeyValueStore};
use std::sync::Arc;

/// State of one cached cross-signing seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedState {
    Missing,
    Invalid(String),
    /// Seed present; carries the derived public key
    Present(String),
}

pub async fn seed_state(store: Arc<IdentityStore>, usage: KeyUsage) -> SeedState {
    let reader = StoreSecretReader::new(store);
    let Some(encoded) = reader.read_secret(&usage.secret_name()).await else {
        return SeedState::Missing;
    };

    let derived = SigningSeed::from_base64(&encoded)
        .and_then(|seed| derive_public_key(seed.as_bytes()));
    match derived {
        Ok(public_key) => SeedState::Present(public_key),
        Err(e) => SeedState::Invalid(e.to_string()),
    }
}

/// Show cached cross-signing seeds and backup state
pub async fn execute(config: &CrossTrustConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(open_store(config).await?);

    println!("🔐 Crosstrust Status");
    println!();
    println!("  User:   {}", config.identity.user_id);
    println!("  Device: {}", config.identity.device_id);
    println!();

    for usage in KeyUsage::ALL {
        match seed_state(store.clone(), usage).await {
            SeedState::Present(public_key) => {
                println!("  ✅ {:<12} {}", usage.as_str(), public_key)
            }
            SeedState::Missing => println!("  ❌ {:<12} no cached seed", usage.as_str()),
            SeedState::Invalid(reason) => {
                println!("  ⚠️ {:<12} invalid seed: {}", usage.as_str(), reason)
            }
        }
    }

    let secret_entries = store
        .primary()
        .entries_with_prefix(store.secret_prefix())
        .await?
        .len();
    println!();
    println!("  Secret entries: {}", secret_entries);
    println!(
        "  Backup entries: {} ({})",
        store.medium().len(),
        config.store.backup_path.display()
    );

    store.primary().close().await;
    Ok(())
}
