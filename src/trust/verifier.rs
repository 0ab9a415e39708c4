//! Trust chain verification
//!
//! Phase A checks our own master key against its private seed and sets the
//! self-trust flag. Phase B walks a remote user's published key graph from
//! our user-signing key down to their devices, stopping at the first link
//! that does not hold.

use super::{CrossSigning, MskVerification, UserTrust};
use crate::crypto::{verify_signature, worst_status, SignatureStatus};
use crate::keys::KeyUsage;
use crate::network::{KeyDirectory, KeyFetch, LocalDevice, SignatureUploader};
use crate::secrets::SecretReader;
use tracing::{debug, info};

impl<R, N, L> CrossSigning<R, N, L>
where
    R: SecretReader,
    N: KeyDirectory + SignatureUploader,
    L: LocalDevice,
{
    /// Phase A: compare the key derived from our master seed with our
    /// published master key, and record the outcome as self-trust.
    pub async fn verify_own_master_key(&self, fetch: KeyFetch) -> MskVerification {
        let verdict = self.check_own_master_key(fetch).await;
        info!(
            user_id = %self.own.user_id,
            ?fetch,
            %verdict,
            "verified own master key"
        );
        self.set_master_key_trusted(verdict.is_valid());
        verdict
    }

    async fn check_own_master_key(&self, fetch: KeyFetch) -> MskVerification {
        let derived = match self.signing_key(KeyUsage::Master).await {
            // The seed itself is dropped here; only the public key is needed
            Some((_, public_key)) => public_key,
            None => return MskVerification::NoPrivKey,
        };

        let Some(published) = self
            .published_key(&self.own.user_id, KeyUsage::Master, fetch)
            .await
        else {
            return MskVerification::NoPubKey;
        };

        if derived == published.public_key {
            MskVerification::Valid
        } else {
            MskVerification::DerivedPubKeyMismatch
        }
    }

    /// Phase B: trust verdict for `user_id`, recomputed on every call.
    pub async fn evaluate_user_trust(&self, user_id: &str) -> UserTrust {
        let verdict = self.walk_trust_chain(user_id).await;
        debug!(user_id = %user_id, %verdict, "evaluated user trust");
        verdict
    }

    async fn walk_trust_chain(&self, user_id: &str) -> UserTrust {
        let own_user_id = self.own.user_id.as_str();
        let fetch = KeyFetch::AllowNetwork;

        if !self.is_master_key_trusted() {
            return UserTrust::OwnSetupError;
        }

        let Some(own_master) = self
            .published_key(own_user_id, KeyUsage::Master, fetch)
            .await
        else {
            debug!("own master key missing");
            return UserTrust::OwnSetupError;
        };

        let Some(own_user_signing) = self
            .published_key(own_user_id, KeyUsage::UserSigning, fetch)
            .await
        else {
            debug!("own user-signing key missing");
            return UserTrust::OwnSetupError;
        };

        if !verify_signature(&own_user_signing.raw, own_user_id, &own_master.public_key).is_valid() {
            debug!("own user-signing key not signed by own master key");
            return UserTrust::OwnSetupError;
        }

        let Some(their_master) = self.published_key(user_id, KeyUsage::Master, fetch).await else {
            return UserTrust::UserNotSigned;
        };

        match verify_signature(&their_master.raw, own_user_id, &own_user_signing.public_key) {
            SignatureStatus::Valid => {}
            SignatureStatus::NotSigned => return UserTrust::UserNotSigned,
            SignatureStatus::Invalid => return UserTrust::UserSignatureMismatch,
        }

        let Some(their_self_signing) = self
            .published_key(user_id, KeyUsage::SelfSigning, fetch)
            .await
        else {
            debug!(user_id = %user_id, "master key without self-signing key");
            return UserTrust::UserSetupError;
        };

        if !verify_signature(&their_self_signing.raw, user_id, &their_master.public_key).is_valid()
        {
            debug!(user_id = %user_id, "self-signing key not signed by master key");
            return UserTrust::UserSetupError;
        }

        let devices = self.server.devices_for_users(&[user_id]).await;
        let worst = worst_status(
            devices
                .iter()
                .map(|device| verify_signature(device, user_id, &their_self_signing.public_key)),
        );

        match worst {
            SignatureStatus::Valid => UserTrust::Trusted,
            SignatureStatus::NotSigned => UserTrust::UserDeviceNotSigned,
            SignatureStatus::Invalid => UserTrust::UserDeviceSignatureMismatch,
        }
    }
}
