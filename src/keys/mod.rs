//! Cross-signing and device key objects
//!
//! Wire-shaped key records as published by the key directory, plus the
//! validation that turns a loosely shaped record into a usable key:
//! - `CrossSigningKey` must carry exactly one usage and exactly one
//!   `ed25519:` key, otherwise it is treated as absent
//! - `DeviceKeys` are looked up by their `ed25519:<device_id>` entry
//!
//! Malformed records never produce errors here. Callers get `None` and the
//! trust engine maps that to "not found" / "not signed".

pub mod cross_signing;
pub mod device;
pub mod usage;

#[cfg(test)]
mod proptests;

use std::collections::BTreeMap;

pub use cross_signing::{CrossSigningKey, PublishedKey};
pub use device::DeviceKeys;
pub use usage::KeyUsage;

/// Prefix of every Ed25519 key id (`ed25519:<id>`).
pub const ED25519_PREFIX: &str = "ed25519:";

/// Signatures map: signer user id -> signer key id -> unpadded base64 signature.
pub type Signatures = BTreeMap<String, BTreeMap<String, String>>;

/// A key object that can carry detached signatures.
///
/// The signable form of an object is everything except its `signatures` and
/// `unsigned` fields (see `crypto::canonical`).
pub trait Signable: serde::Serialize + Clone {
    fn signatures(&self) -> &Signatures;

    fn signatures_mut(&mut self) -> &mut Signatures;

    /// Copy of the object with every existing signature removed.
    ///
    /// Signing appends alongside existing entries, so objects that are about
    /// to be re-signed and uploaded should be stripped first.
    fn without_signatures(&self) -> Self {
        let mut stripped = self.clone();
        stripped.signatures_mut().clear();
        stripped
    }

    /// Signature made by `signer_user_id` with key id `key_id`, if present.
    fn signature(&self, signer_user_id: &str, key_id: &str) -> Option<&str> {
        self.signatures()
            .get(signer_user_id)
            .and_then(|by_key| by_key.get(key_id))
            .map(String::as_str)
    }
}

/// Build an `ed25519:<id>` key id.
pub fn ed25519_key_id(id: &str) -> String {
    format!("{ED25519_PREFIX}{id}")
}
