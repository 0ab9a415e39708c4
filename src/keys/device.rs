use super::{ed25519_key_id, Signable, Signatures};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Per-device identity bundle.
///
/// Signed by the device's own Ed25519 key (self-attestation) and, once
/// cross-signed, by the owner's self-signing key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceKeys {
    pub user_id: String,
    pub device_id: String,

    #[serde(default)]
    pub algorithms: Vec<String>,

    /// `ed25519:<device_id>` and `curve25519:<device_id>` public keys
    #[serde(default)]
    pub keys: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub signatures: Signatures,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceKeys {
    pub fn new(
        user_id: impl Into<String>,
        device_id: impl Into<String>,
        ed25519: impl Into<String>,
        curve25519: impl Into<String>,
    ) -> Self {
        let device_id = device_id.into();
        let mut keys = BTreeMap::new();
        keys.insert(ed25519_key_id(&device_id), ed25519.into());
        keys.insert(format!("curve25519:{device_id}"), curve25519.into());

        Self {
            user_id: user_id.into(),
            device_id,
            algorithms: vec![
                "m.olm.v1.curve25519-aes-sha2".to_string(),
                "m.megolm.v1.aes-sha2".to_string(),
            ],
            keys,
            signatures: Signatures::new(),
            extra: Map::new(),
        }
    }

    pub fn ed25519_key(&self) -> Option<&str> {
        self.keys
            .get(&ed25519_key_id(&self.device_id))
            .map(String::as_str)
    }

    pub fn curve25519_key(&self) -> Option<&str> {
        self.keys
            .get(&format!("curve25519:{}", self.device_id))
            .map(String::as_str)
    }
}

impl Signable for DeviceKeys {
    fn signatures(&self) -> &Signatures {
        &self.signatures
    }

    fn signatures_mut(&mut self) -> &mut Signatures {
        &mut self.signatures
    }
}
