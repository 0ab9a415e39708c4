//! Deterministic identities for tests and benchmarks
//!
//! An `IdentityFixture` owns three fixed seeds and can produce the matching
//! published cross-signing keys, device bundles and secret entries.

use crate::crypto::{sign_object, SigningError, SigningSeed, BASE64};
use crate::keys::{CrossSigningKey, DeviceKeys, KeyUsage, Signable};
use crate::network::MockKeyServer;
use crate::secrets::MemorySecretReader;
use base64::Engine;

#[derive(Debug, Clone)]
pub struct IdentityFixture {
    pub user_id: String,
    seed_byte: u8,
}

impl IdentityFixture {
    /// Seeds are `[b; 32]`, `[b + 1; 32]`, `[b + 2; 32]` for master,
    /// self-signing and user-signing.
    pub fn new(user_id: impl Into<String>, seed_byte: u8) -> Self {
        Self {
            user_id: user_id.into(),
            seed_byte,
        }
    }

    pub fn seed_bytes(&self, usage: KeyUsage) -> [u8; 32] {
        let offset = match usage {
            KeyUsage::Master => 0,
            KeyUsage::SelfSigning => 1,
            KeyUsage::UserSigning => 2,
        };
        [self.seed_byte.wrapping_add(offset); 32]
    }

    pub fn seed(&self, usage: KeyUsage) -> SigningSeed {
        SigningSeed::from_bytes(self.seed_bytes(usage).to_vec())
    }

    pub fn seed_base64(&self, usage: KeyUsage) -> String {
        BASE64.encode(self.seed_bytes(usage))
    }

    pub fn public_key(&self, usage: KeyUsage) -> Result<String, SigningError> {
        self.seed(usage).public_key()
    }

    /// Master key, self-signed by the master seed.
    pub fn master_key(&self) -> Result<CrossSigningKey, SigningError> {
        let key = CrossSigningKey::new(
            &self.user_id,
            KeyUsage::Master,
            self.public_key(KeyUsage::Master)?,
        );
        sign_object(&key, &self.seed(KeyUsage::Master), &self.user_id)
    }

    /// Self-signing or user-signing key, signed by the master seed.
    pub fn subkey(&self, usage: KeyUsage) -> Result<CrossSigningKey, SigningError> {
        let key = CrossSigningKey::new(&self.user_id, usage, self.public_key(usage)?);
        sign_object(&key, &self.seed(KeyUsage::Master), &self.user_id)
    }

    /// Publish all three keys on `server`.
    pub fn publish(&self, server: &MockKeyServer) -> Result<(), SigningError> {
        server.publish_key(KeyUsage::Master, self.master_key()?);
        server.publish_key(KeyUsage::SelfSigning, self.subkey(KeyUsage::SelfSigning)?);
        server.publish_key(KeyUsage::UserSigning, self.subkey(KeyUsage::UserSigning)?);
        Ok(())
    }

    /// Cache all three seeds in `reader`.
    pub fn store_secrets(&self, reader: &MemorySecretReader) {
        for usage in KeyUsage::ALL {
            reader.insert(usage.secret_name(), self.seed_base64(usage));
        }
    }

    /// Device bundle self-signed by the device key, not cross-signed.
    pub fn device(&self, device_id: &str) -> Result<DeviceKeys, SigningError> {
        let device_seed = device_seed(device_id);
        let device_key = device_seed.public_key()?;
        let keys = DeviceKeys::new(
            &self.user_id,
            device_id,
            device_key.clone(),
            device_key.clone(),
        );

        let mut signed = sign_object(&keys, &device_seed, &self.user_id)?;
        // A device signs under its device id, not its public key
        let signatures = signed.signatures_mut();
        if let Some(own) = signatures.get_mut(&self.user_id) {
            if let Some(signature) = own.remove(&format!("ed25519:{}", device_key)) {
                own.insert(format!("ed25519:{device_id}"), signature);
            }
        }
        Ok(signed)
    }

    /// Device bundle cross-signed by this identity's self-signing key.
    pub fn signed_device(&self, device_id: &str) -> Result<DeviceKeys, SigningError> {
        sign_object(
            &self.device(device_id)?,
            &self.seed(KeyUsage::SelfSigning),
            &self.user_id,
        )
    }

    /// `other`'s master key signed by this identity's user-signing key.
    pub fn sign_master_of(&self, other: &IdentityFixture) -> Result<CrossSigningKey, SigningError> {
        sign_object(
            &other.master_key()?,
            &self.seed(KeyUsage::UserSigning),
            &self.user_id,
        )
    }
}

fn device_seed(device_id: &str) -> SigningSeed {
    let mut bytes = vec![0x5a; 32];
    for (slot, byte) in bytes.iter_mut().zip(device_id.bytes().cycle()) {
        *slot ^= byte;
    }
    SigningSeed::from_bytes(bytes)
}
