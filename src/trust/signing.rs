//! Signing operations
//!
//! All operations are gated on self-trust. While our master key is not
//! trusted they return `Ok(None)` without touching the network. Private seeds
//! are read from secret storage per call and dropped before returning.

use super::CrossSigning;
use crate::crypto::{sign_object, SigningError};
use crate::keys::{CrossSigningKey, DeviceKeys, KeyUsage, Signable};
use crate::network::{
    KeyDirectory, KeyFetch, LocalDevice, NetworkError, SignatureUpload, SignatureUploader,
};
use crate::secrets::SecretReader;
use thiserror::Error;
use tracing::{debug, info};

/// Signing operation failures.
///
/// Missing keys, devices and trust are not errors; see the operations.
#[derive(Debug, Error)]
pub enum CrossSigningError {
    #[error("Signature upload failed: {0}")]
    Upload(#[from] NetworkError),

    #[error("Signing failed: {0}")]
    Signing(#[from] SigningError),
}

impl<R, N, L> CrossSigning<R, N, L>
where
    R: SecretReader,
    N: KeyDirectory + SignatureUploader,
    L: LocalDevice,
{
    fn signing_allowed(&self, operation: &str) -> bool {
        let trusted = self.is_master_key_trusted();
        if !trusted {
            debug!(operation, "own master key not trusted, not signing");
        }
        trusted
    }

    /// Sign this device's keys with our self-signing key.
    ///
    /// The signed bundle is returned, not uploaded.
    pub async fn sign_own_device(&self) -> Result<Option<DeviceKeys>, CrossSigningError> {
        if !self.signing_allowed("sign_own_device") {
            return Ok(None);
        }

        let keys = self.device.unsigned_device_keys().await;
        let Some((seed, _)) = self.signing_key(KeyUsage::SelfSigning).await else {
            return Ok(None);
        };

        Ok(Some(sign_object(&keys, &seed, &self.own.user_id)?))
    }

    /// Sign one of our other devices with our self-signing key and upload
    /// the signature.
    pub async fn sign_device(
        &self,
        device_id: &str,
    ) -> Result<Option<DeviceKeys>, CrossSigningError> {
        if !self.signing_allowed("sign_device") {
            return Ok(None);
        }

        let Some(keys) = self.server.device(&self.own.user_id, device_id).await else {
            debug!(device_id = %device_id, "device not found, not signing");
            return Ok(None);
        };

        let signed = {
            let Some((seed, _)) = self.signing_key(KeyUsage::SelfSigning).await else {
                return Ok(None);
            };
            sign_object(&keys.without_signatures(), &seed, &self.own.user_id)?
        };

        let payload = SignatureUpload::single(&self.own.user_id, device_id, &signed)?;
        self.server.upload_signatures(&payload).await?;

        info!(device_id = %device_id, "signed own device");
        Ok(Some(signed))
    }

    /// Sign `user_id`'s master key with our user-signing key and upload the
    /// signature. Never signs our own user.
    pub async fn sign_user(
        &self,
        user_id: &str,
    ) -> Result<Option<CrossSigningKey>, CrossSigningError> {
        if user_id == self.own.user_id {
            debug!("refusing to sign own user");
            return Ok(None);
        }
        if !self.signing_allowed("sign_user") {
            return Ok(None);
        }

        let Some(their_master) = self
            .published_key(user_id, KeyUsage::Master, KeyFetch::AllowNetwork)
            .await
        else {
            debug!(user_id = %user_id, "no master key published, not signing");
            return Ok(None);
        };

        let signed = {
            let Some((seed, _)) = self.signing_key(KeyUsage::UserSigning).await else {
                return Ok(None);
            };
            sign_object(&their_master.raw.without_signatures(), &seed, &self.own.user_id)?
        };

        let payload = SignatureUpload::single(user_id, &their_master.public_key, &signed)?;
        self.server.upload_signatures(&payload).await?;

        info!(user_id = %user_id, "signed user master key");
        Ok(Some(signed))
    }
}
