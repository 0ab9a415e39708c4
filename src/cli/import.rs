use super::config::CrossTrustConfig;
use super::{open_store, IdentityStore};
use crosstrust::crypto::SigningSeed;
use crosstrust::keys::KeyUsage;
use crosstrust::secrets::StoreSecretReader;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of one import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: Vec<String>,
    pub rejected: Vec<String>,
    pub backed_up: usize,
}

/// Read a JSON object of secret name -> base64 seed.
pub fn read_secrets_file(path: &Path) -> Result<BTreeMap<String, String>, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read secrets file '{}': {}", path.display(), e))?;
    let secrets = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse secrets file '{}': {}", path.display(), e))?;
    Ok(secrets)
}

/// Write every cross-signing seed in `secrets` through the resilient store,
/// then force a full backup.
///
/// Unknown names and seeds that cannot derive a key are rejected.
pub async fn import_secrets(
    store: Arc<IdentityStore>,
    secrets: &BTreeMap<String, String>,
) -> Result<ImportSummary, Box<dyn std::error::Error>> {
    let known: Vec<String> = KeyUsage::ALL.iter().map(KeyUsage::secret_name).collect();
    let writer = StoreSecretReader::new(store.clone());
    let mut summary = ImportSummary::default();

    for (name, encoded) in secrets {
        if !known.contains(name) {
            warn!(secret = %name, "not a cross-signing secret, skipping");
            summary.rejected.push(name.clone());
            continue;
        }
        if let Err(e) = SigningSeed::from_base64(encoded).and_then(|seed| seed.public_key()) {
            warn!(secret = %name, error = %e, "invalid seed, skipping");
            summary.rejected.push(name.clone());
            continue;
        }

        writer.store_secret(name, encoded.trim()).await?;
        summary.imported.push(name.clone());
    }

    summary.backed_up = store.write_backup().await?;
    info!(
        imported = summary.imported.len(),
        rejected = summary.rejected.len(),
        "imported cross-signing secrets"
    );
    Ok(summary)
}

/// Import cross-signing seeds from `file`
pub async fn execute(
    config: &CrossTrustConfig,
    file: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let secrets = read_secrets_file(Path::new(file))?;
    let store = Arc::new(open_store(config).await?);

    let summary = import_secrets(store.clone(), &secrets).await?;
    store.primary().close().await;

    println!("✅ Imported {} secret(s)", summary.imported.len());
    for name in &summary.rejected {
        println!("  ⚠️ Rejected: {}", name);
    }
    println!("  Backup entries written: {}", summary.backed_up);

    if summary.imported.is_empty() {
        return Err("No valid cross-signing secrets found".into());
    }
    Ok(())
}
