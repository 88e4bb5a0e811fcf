use super::{KeyValueStore, StoreError, KEY_ACCESS_TOKEN};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub const KEYRING_SERVICE: &str = "com.softaworks.jobboard";

/// Store backed by the OS keychain / secret service, one credential per key.
///
/// Reads are cached in memory after the first hit so the keychain is only
/// consulted once per key and process.
#[derive(Clone)]
pub struct KeyringStore {
    service: &'static str,
    cache: Arc<Mutex<HashMap<String, String>>>,
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE)
    }
}

impl KeyringStore {
    pub fn new(service: &'static str) -> Self {
        Self {
            service,
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, StoreError> {
        keyring::Entry::new(self.service, key).map_err(map_keyring_error)
    }

    /// Checks the backend by reading the access-token credential. A missing or
    /// unreadable entry still means the keychain answered.
    pub fn is_available(&self) -> bool {
        let read = self.entry(KEY_ACCESS_TOKEN).map(|entry| entry.get_password());
        match read {
            Ok(Ok(_)) | Ok(Err(keyring::Error::NoEntry | keyring::Error::BadEncoding(_))) => true,
            Ok(Err(e)) => {
                debug!(error = %e, service = self.service, "keychain check failed");
                false
            }
            Err(_) => false,
        }
    }
}

fn map_keyring_error(err: keyring::Error) -> StoreError {
    match err {
        keyring::Error::NoStorageAccess(_) | keyring::Error::PlatformFailure(_) => {
            StoreError::Unavailable
        }
        other => StoreError::Keyring(other),
    }
}

#[async_trait]
impl KeyValueStore for KeyringStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if let Some(value) = self.cache.lock().await.get(key).cloned() {
            return Ok(Some(value));
        }

        match self.entry(key)?.get_password() {
            Ok(value) if value.is_empty() => Ok(None),
            Ok(value) => {
                self.cache
                    .lock()
                    .await
                    .insert(key.to_string(), value.clone());
                Ok(Some(value))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(map_keyring_error(e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entry(key)?
            .set_password(value)
            .map_err(map_keyring_error)?;
        self.cache
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.cache.lock().await.remove(key);
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(map_keyring_error(e)),
        }
    }
}
