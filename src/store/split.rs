use super::{KeyValueStore, StoreError, KEY_ACCESS_TOKEN, KEY_REFRESH_TOKEN};
use async_trait::async_trait;
use std::sync::Arc;

/// Sends the token keys to `secrets` and every other key to `rest`.
#[derive(Clone)]
pub struct SplitStore {
    secrets: Arc<dyn KeyValueStore>,
    rest: Arc<dyn KeyValueStore>,
}

impl SplitStore {
    pub fn new(secrets: Arc<dyn KeyValueStore>, rest: Arc<dyn KeyValueStore>) -> Self {
        Self { secrets, rest }
    }

    fn route(&self, key: &str) -> &dyn KeyValueStore {
        match key {
            KEY_ACCESS_TOKEN | KEY_REFRESH_TOKEN => self.secrets.as_ref(),
            _ => self.rest.as_ref(),
        }
    }
}

#[async_trait]
impl KeyValueStore for SplitStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.route(key).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.route(key).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.route(key).remove(key).await
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let (secret_keys, other_keys): (Vec<&str>, Vec<&str>) = keys
            .iter()
            .copied()
            .partition(|key| matches!(*key, KEY_ACCESS_TOKEN | KEY_REFRESH_TOKEN));
        self.secrets.multi_remove(&secret_keys).await?;
        self.rest.multi_remove(&other_keys).await
    }
}
