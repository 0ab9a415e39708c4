//! Published cross-signing keys (MSK / SSK / USK)

use super::{ed25519_key_id, KeyUsage, Signable, Signatures, ED25519_PREFIX};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// A cross-signing key as published by the key directory.
///
/// The record is kept in its loose wire shape so that signatures can be
/// checked over exactly what was published (unknown fields included). Use
/// [`CrossSigningKey::validate`] to get a [`PublishedKey`] before relying on
/// its usage or public key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSigningKey {
    pub user_id: String,

    #[serde(default)]
    pub usage: Vec<KeyUsage>,

    /// Algorithm-prefixed key id -> unpadded base64 public key
    #[serde(default)]
    pub keys: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub signatures: Signatures,

    /// Fields this crate does not interpret (e.g. `unsigned`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CrossSigningKey {
    /// Well-formed key for `user_id` with a single usage and Ed25519 public key.
    ///
    /// The key id of a cross-signing key is its own public key.
    pub fn new(user_id: impl Into<String>, usage: KeyUsage, public_key: impl Into<String>) -> Self {
        let public_key = public_key.into();
        let mut keys = BTreeMap::new();
        keys.insert(ed25519_key_id(&public_key), public_key);

        Self {
            user_id: user_id.into(),
            usage: vec![usage],
            keys,
            signatures: Signatures::new(),
            extra: Map::new(),
        }
    }

    /// The key's single usage, or `None` when zero or several are listed.
    pub fn key_usage(&self) -> Option<KeyUsage> {
        match self.usage.as_slice() {
            [usage] => Some(*usage),
            other => {
                debug!(
                    user_id = %self.user_id,
                    usages = other.len(),
                    "cross-signing key has malformed usage"
                );
                None
            }
        }
    }

    /// The key's single Ed25519 public key, or `None` when zero or several
    /// `ed25519:` entries are present.
    pub fn ed25519_key(&self) -> Option<&str> {
        let mut ed25519 = self
            .keys
            .iter()
            .filter(|(key_id, _)| key_id.starts_with(ED25519_PREFIX));

        match (ed25519.next(), ed25519.next()) {
            (Some((_, public_key)), None) => Some(public_key.as_str()),
            (None, _) => None,
            (Some(_), Some(_)) => {
                debug!(user_id = %self.user_id, "cross-signing key has several ed25519 keys");
                None
            }
        }
    }

    /// Validate the record for use as a key with the `expected` usage.
    ///
    /// Returns `None` for malformed cardinality or a usage mismatch.
    pub fn validate(&self, expected: KeyUsage) -> Option<PublishedKey> {
        let usage = self.key_usage()?;
        if usage != expected {
            debug!(
                user_id = %self.user_id,
                %usage,
                %expected,
                "cross-signing key published under the wrong usage"
            );
            return None;
        }

        let public_key = self.ed25519_key()?.to_string();
        Some(PublishedKey {
            user_id: self.user_id.clone(),
            usage,
            public_key,
            raw: self.clone(),
        })
    }
}

impl Signable for CrossSigningKey {
    fn signatures(&self) -> &Signatures {
        &self.signatures
    }

    fn signatures_mut(&mut self) -> &mut Signatures {
        &mut self.signatures
    }
}

/// A cross-signing key that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedKey {
    pub user_id: String,
    pub usage: KeyUsage,
    /// Unpadded base64 Ed25519 public key
    pub public_key: String,
    /// The record as published, signatures included
    pub raw: CrossSigningKey,
}

impl PublishedKey {
    /// `ed25519:<public key>`
    pub fn key_id(&self) -> String {
        ed25519_key_id(&self.public_key)
    }
}
