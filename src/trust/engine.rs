//! Cross-signing engine state
//!
//! `CrossSigning` owns the single piece of persistent trust state, the "own
//! master key is trusted" flag, and the collaborators every trust operation
//! goes through. The trust-chain walk and the signing operations live in
//! `verifier.rs` and `signing.rs` as further `impl` blocks.

use crate::crypto::SigningSeed;
use crate::keys::{KeyUsage, PublishedKey};
use crate::network::{KeyDirectory, KeyFetch, LocalDevice, SignatureUploader};
use crate::secrets::SecretReader;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// The local identity trust is evaluated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnIdentity {
    pub user_id: String,
    pub device_id: String,
}

impl OwnIdentity {
    pub fn new(user_id: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            device_id: device_id.into(),
        }
    }
}

/// Cross-signing trust engine for one local identity.
///
/// `R` supplies private seeds, `N` is the key directory and signature upload
/// API (usually one homeserver client), `L` is this device.
pub struct CrossSigning<R, N, L> {
    pub(super) own: OwnIdentity,
    pub(super) secrets: R,
    pub(super) server: N,
    pub(super) device: L,
    master_key_trusted: AtomicBool,
}

impl<R, N, L> CrossSigning<R, N, L>
where
    R: SecretReader,
    N: KeyDirectory + SignatureUploader,
    L: LocalDevice,
{
    /// Engine with self-trust unset. Prefer [`CrossSigning::load`].
    pub fn new(own: OwnIdentity, secrets: R, server: N, device: L) -> Self {
        Self {
            own,
            secrets,
            server,
            device,
            master_key_trusted: AtomicBool::new(false),
        }
    }

    /// Build the engine and run the offline self-trust check once, so a
    /// cached decision is available without network access.
    pub async fn load(own: OwnIdentity, secrets: R, server: N, device: L) -> Self {
        let engine = Self::new(own, secrets, server, device);
        engine.verify_own_master_key(KeyFetch::LocalOnly).await;
        engine
    }

    /// Re-check self-trust with network access unless the offline pass
    /// already established it. Returns the resulting self-trust flag.
    pub async fn start(&self) -> bool {
        if self.is_master_key_trusted() {
            debug!(user_id = %self.own.user_id, "own master key already trusted");
            return true;
        }

        self.verify_own_master_key(KeyFetch::AllowNetwork)
            .await
            .is_valid()
    }

    pub fn own_identity(&self) -> &OwnIdentity {
        &self.own
    }

    pub fn is_master_key_trusted(&self) -> bool {
        self.master_key_trusted.load(Ordering::SeqCst)
    }

    pub(super) fn set_master_key_trusted(&self, trusted: bool) {
        let previous = self.master_key_trusted.swap(trusted, Ordering::SeqCst);
        if previous != trusted {
            info!(user_id = %self.own.user_id, trusted, "own master key trust changed");
        }
    }

    pub fn secrets(&self) -> &R {
        &self.secrets
    }

    pub fn server(&self) -> &N {
        &self.server
    }

    /// Private seed for `usage` together with its derived public key.
    ///
    /// Read fresh from secret storage on every call. A seed that does not
    /// decode or derive is reported and treated as missing.
    pub(super) async fn signing_key(&self, usage: KeyUsage) -> Option<(SigningSeed, String)> {
        let encoded = self.secrets.read_secret(&usage.secret_name()).await?;

        let seed = match SigningSeed::from_base64(&encoded) {
            Ok(seed) => seed,
            Err(e) => {
                warn!(%usage, error = %e, "cached cross-signing seed is not valid base64");
                return None;
            }
        };

        match seed.public_key() {
            Ok(public_key) => Some((seed, public_key)),
            Err(e) => {
                warn!(%usage, error = %e, "cached cross-signing seed cannot derive a key");
                None
            }
        }
    }

    /// Published key of `user_id` for `usage`, if present and well-formed.
    pub(super) async fn published_key(
        &self,
        user_id: &str,
        usage: KeyUsage,
        fetch: KeyFetch,
    ) -> Option<PublishedKey> {
        self.server
            .cross_signing_key(user_id, usage, fetch)
            .await?
            .validate(usage)
    }
}
