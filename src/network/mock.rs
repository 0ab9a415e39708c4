//! Mock key server for testing
//!
//! Serves published keys from memory, records every lookup and upload for
//! assertions, and can be told to fail uploads.

use super::traits::*;
use crate::keys::{CrossSigningKey, DeviceKeys, KeyUsage};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// In-memory key directory and signature uploader
#[derive(Clone, Default)]
pub struct MockKeyServer {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Keys visible to local lookups
    cached_keys: HashMap<(String, KeyUsage), CrossSigningKey>,
    /// Keys only the server knows about
    remote_keys: HashMap<(String, KeyUsage), CrossSigningKey>,
    devices: HashMap<String, BTreeMap<String, DeviceKeys>>,
    key_lookups: Vec<KeyLookup>,
    device_lookups: usize,
    uploads: Vec<SignatureUpload>,
    upload_failure: Option<NetworkError>,
}

/// One recorded `cross_signing_key` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLookup {
    pub user_id: String,
    pub usage: KeyUsage,
    pub fetch: KeyFetch,
}

impl MockKeyServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `key` under `usage`, visible to local lookups.
    ///
    /// The usage is explicit so that malformed records can be served.
    pub fn publish_key(&self, usage: KeyUsage, key: CrossSigningKey) {
        let mut state = self.state.lock().unwrap();
        state.cached_keys.insert((key.user_id.clone(), usage), key);
    }

    /// Publish `key` on the server only; local lookups will not see it.
    pub fn publish_remote_key(&self, usage: KeyUsage, key: CrossSigningKey) {
        let mut state = self.state.lock().unwrap();
        state.remote_keys.insert((key.user_id.clone(), usage), key);
    }

    pub fn unpublish_key(&self, user_id: &str, usage: KeyUsage) {
        let mut state = self.state.lock().unwrap();
        let slot = (user_id.to_string(), usage);
        state.cached_keys.remove(&slot);
        state.remote_keys.remove(&slot);
    }

    pub fn add_device(&self, device: DeviceKeys) {
        let mut state = self.state.lock().unwrap();
        state
            .devices
            .entry(device.user_id.clone())
            .or_default()
            .insert(device.device_id.clone(), device);
    }

    /// Make subsequent uploads fail with `error` (or succeed with `None`).
    pub fn fail_uploads(&self, error: Option<NetworkError>) {
        self.state.lock().unwrap().upload_failure = error;
    }

    /// Accepted uploads, in order
    pub fn uploads(&self) -> Vec<SignatureUpload> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn key_lookups(&self) -> Vec<KeyLookup> {
        self.state.lock().unwrap().key_lookups.clone()
    }

    /// Number of lookups for `user_id`'s key with `usage`
    pub fn key_lookup_count(&self, user_id: &str, usage: KeyUsage) -> usize {
        self.state
            .lock()
            .unwrap()
            .key_lookups
            .iter()
            .filter(|lookup| lookup.user_id == user_id && lookup.usage == usage)
            .count()
    }

    /// Number of `device` and `devices_for_users` calls
    pub fn device_lookup_count(&self) -> usize {
        self.state.lock().unwrap().device_lookups
    }

    /// Forget recorded calls and uploads, keeping published keys
    pub fn clear_calls(&self) {
        let mut state = self.state.lock().unwrap();
        state.key_lookups.clear();
        state.device_lookups = 0;
        state.uploads.clear();
    }
}

#[async_trait]
impl KeyDirectory for MockKeyServer {
    async fn cross_signing_key(
        &self,
        user_id: &str,
        usage: KeyUsage,
        fetch: KeyFetch,
    ) -> Option<CrossSigningKey> {
        let mut state = self.state.lock().unwrap();
        state.key_lookups.push(KeyLookup {
            user_id: user_id.to_string(),
            usage,
            fetch,
        });

        let slot = (user_id.to_string(), usage);
        if let Some(key) = state.cached_keys.get(&slot) {
            return Some(key.clone());
        }

        match fetch {
            KeyFetch::LocalOnly => None,
            KeyFetch::AllowNetwork => {
                let key = state.remote_keys.get(&slot).cloned()?;
                // A fetched key is cached from then on
                state.cached_keys.insert(slot, key.clone());
                Some(key)
            }
        }
    }

    async fn device(&self, user_id: &str, device_id: &str) -> Option<DeviceKeys> {
        let mut state = self.state.lock().unwrap();
        state.device_lookups += 1;
        state.devices.get(user_id)?.get(device_id).cloned()
    }

    async fn devices_for_users(&self, user_ids: &[&str]) -> Vec<DeviceKeys> {
        let mut state = self.state.lock().unwrap();
        state.device_lookups += 1;
        user_ids
            .iter()
            .filter_map(|user_id| state.devices.get(*user_id))
            .flat_map(|devices| devices.values().cloned())
            .collect()
    }
}

#[async_trait]
impl SignatureUploader for MockKeyServer {
    async fn upload_signatures(&self, payload: &SignatureUpload) -> NetworkResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.upload_failure.clone() {
            return Err(error);
        }
        state.uploads.push(payload.clone());
        Ok(())
    }
}

/// Local device backed by a fixed key bundle
#[derive(Debug, Clone)]
pub struct StaticDevice {
    keys: DeviceKeys,
}

impl StaticDevice {
    pub fn new(keys: DeviceKeys) -> Self {
        Self { keys }
    }
}

#[async_trait]
impl LocalDevice for StaticDevice {
    async fn unsigned_device_keys(&self) -> DeviceKeys {
        self.keys.clone()
    }
}
