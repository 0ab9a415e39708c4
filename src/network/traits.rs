//! Key directory and upload abstractions
//!
//! These traits let the trust engine run against `MockKeyServer` in tests
//! and against a real homeserver client in production.

use crate::keys::{CrossSigningKey, DeviceKeys, KeyUsage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Whether a key lookup may go to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFetch {
    /// Answer from locally cached keys only
    LocalOnly,
    /// Fetch from the server when the local cache has nothing
    AllowNetwork,
}

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Network errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetworkError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server rejected request ({status}): {reason}")]
    Rejected { status: u16, reason: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for NetworkError {
    fn from(e: serde_json::Error) -> Self {
        NetworkError::Serialization(e.to_string())
    }
}

/// Signature upload payload.
///
/// `{ <subject user id>: { <device id or public key>: <signed object> } }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureUpload(pub BTreeMap<String, BTreeMap<String, Value>>);

impl SignatureUpload {
    /// Payload carrying one signed object.
    pub fn single<T: Serialize>(
        subject_user_id: &str,
        object_id: &str,
        signed: &T,
    ) -> NetworkResult<Self> {
        let mut inner = BTreeMap::new();
        inner.insert(object_id.to_string(), serde_json::to_value(signed)?);

        let mut outer = BTreeMap::new();
        outer.insert(subject_user_id.to_string(), inner);
        Ok(Self(outer))
    }

    pub fn get(&self, subject_user_id: &str, object_id: &str) -> Option<&Value> {
        self.0.get(subject_user_id)?.get(object_id)
    }

    /// Number of signed objects in the payload.
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Directory of published identity keys.
///
/// Lookups return `None` for anything unknown; the trust engine treats
/// absence as a verdict, never as an error.
#[async_trait]
pub trait KeyDirectory: Send + Sync {
    /// Cross-signing key of `user_id` with the given usage
    async fn cross_signing_key(
        &self,
        user_id: &str,
        usage: KeyUsage,
        fetch: KeyFetch,
    ) -> Option<CrossSigningKey>;

    /// Keys of one device
    async fn device(&self, user_id: &str, device_id: &str) -> Option<DeviceKeys>;

    /// All known devices of the given users
    async fn devices_for_users(&self, user_ids: &[&str]) -> Vec<DeviceKeys>;
}

/// Signature upload API
#[async_trait]
pub trait SignatureUploader: Send + Sync {
    /// Upload signatures and wait for the server to accept them.
    async fn upload_signatures(&self, payload: &SignatureUpload) -> NetworkResult<()>;
}

/// This device's own key bundle
#[async_trait]
pub trait LocalDevice: Send + Sync {
    /// Device keys as published, without cross-signing signatures
    async fn unsigned_device_keys(&self) -> DeviceKeys;
}
