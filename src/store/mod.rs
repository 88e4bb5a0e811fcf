//! Device-local key-value storage shared by the session and the application
//! list. Values are opaque strings; callers serialize JSON themselves.

mod file;
mod memory;
mod secret;
mod split;

pub use self::file::{FileStore, DEFAULT_STORE_FILE};
pub use self::memory::MemoryStore;
pub use self::secret::{KeyringStore, KEYRING_SERVICE};
pub use self::split::SplitStore;

use async_trait::async_trait;
use thiserror::Error;

pub const KEY_ACCESS_TOKEN: &str = "accessToken";
pub const KEY_REFRESH_TOKEN: &str = "refreshToken";
pub const KEY_USER: &str = "user";
pub const KEY_APPLICATIONS: &str = "@job_applications";

/// Keys holding the auth session (everything but the application list).
pub const SESSION_KEYS: [&str; 3] = [KEY_ACCESS_TOKEN, KEY_REFRESH_TOKEN, KEY_USER];

/// Every key this crate writes.
pub const ALL_KEYS: [&str; 4] = [KEY_ACCESS_TOKEN, KEY_REFRESH_TOKEN, KEY_USER, KEY_APPLICATIONS];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error")]
    Io(#[from] std::io::Error),
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("keyring error")]
    Keyring(#[from] keyring::Error),
    #[error("OS keychain/secret service is unavailable")]
    Unavailable,
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    async fn multi_remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}
