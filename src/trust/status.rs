use super::CrossSigning;
use crate::keys::KeyUsage;
use crate::network::{KeyDirectory, KeyFetch, LocalDevice, SignatureUploader};
use crate::secrets::SecretReader;
use serde::Serialize;

/// State of one of our cross-signing keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyStatus {
    pub usage: KeyUsage,
    /// Public key derived from the cached private seed
    pub derived_public_key: Option<String>,
    /// Public key as published in the key directory
    pub published_public_key: Option<String>,
}

impl KeyStatus {
    pub fn has_private_key(&self) -> bool {
        self.derived_public_key.is_some()
    }

    /// Seed and published key are both present and agree
    pub fn matches(&self) -> bool {
        match (&self.derived_public_key, &self.published_public_key) {
            (Some(derived), Some(published)) => derived == published,
            _ => false,
        }
    }
}

/// Report on our own cross-signing setup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnStatus {
    pub user_id: String,
    pub master_key_trusted: bool,
    pub keys: Vec<KeyStatus>,
}

impl OwnStatus {
    pub fn key(&self, usage: KeyUsage) -> Option<&KeyStatus> {
        self.keys.iter().find(|status| status.usage == usage)
    }

    /// Every key has a seed matching its published key
    pub fn is_complete(&self) -> bool {
        self.keys.len() == KeyUsage::ALL.len() && self.keys.iter().all(KeyStatus::matches)
    }
}

impl<R, N, L> CrossSigning<R, N, L>
where
    R: SecretReader,
    N: KeyDirectory + SignatureUploader,
    L: LocalDevice,
{
    /// Report seed and published key state for all three usages.
    ///
    /// Does not change self-trust.
    pub async fn own_status(&self, fetch: KeyFetch) -> OwnStatus {
        let mut keys = Vec::with_capacity(KeyUsage::ALL.len());
        for usage in KeyUsage::ALL {
            let derived_public_key = self
                .signing_key(usage)
                .await
                .map(|(_, public_key)| public_key);
            let published_public_key = self
                .published_key(&self.own.user_id, usage, fetch)
                .await
                .map(|published| published.public_key);

            keys.push(KeyStatus {
                usage,
                derived_public_key,
                published_public_key,
            });
        }

        OwnStatus {
            user_id: self.own.user_id.clone(),
            master_key_trusted: self.is_master_key_trusted(),
            keys,
        }
    }
}
