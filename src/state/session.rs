use crate::store::{
    KeyValueStore, StoreError, ALL_KEYS, KEY_ACCESS_TOKEN, KEY_REFRESH_TOKEN, KEY_USER,
    SESSION_KEYS,
};
use crate::types::User;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Anonymous,
    Authenticating,
    Authenticated,
    /// Refresh failed; credentials were discarded and a new login is needed.
    Expired,
}

/// Handle on the persisted auth session.
///
/// Cloned into every component that needs credentials; clones share the same
/// store, phase and application write lock.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn KeyValueStore>,
    phase: Arc<Mutex<SessionPhase>>,
    applications_lock: Arc<Mutex<()>>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

impl Session {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            phase: Arc::new(Mutex::new(SessionPhase::Anonymous)),
            applications_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Held by every write to the application list, including logout.
    pub(crate) fn applications_lock(&self) -> Arc<Mutex<()>> {
        self.applications_lock.clone()
    }

    pub async fn phase(&self) -> SessionPhase {
        *self.phase.lock().await
    }

    pub(crate) async fn set_phase(&self, phase: SessionPhase) {
        let mut guard = self.phase.lock().await;
        let previous = *guard;
        if previous != phase {
            debug!(from = ?previous, to = ?phase, "session phase changed");
        }
        *guard = phase;
    }

    /// Derives the phase from what is persisted, for app start-up.
    pub async fn restore(&self) -> Result<SessionPhase, StoreError> {
        let phase = if self.access_token().await?.is_some() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        };
        self.set_phase(phase).await;
        Ok(phase)
    }

    pub async fn access_token(&self) -> Result<Option<String>, StoreError> {
        Ok(non_empty(self.store.get(KEY_ACCESS_TOKEN).await?))
    }

    pub async fn refresh_token(&self) -> Result<Option<String>, StoreError> {
        Ok(non_empty(self.store.get(KEY_REFRESH_TOKEN).await?))
    }

    /// Stores a token pair. A missing refresh token keeps the previous one.
    pub async fn save_tokens(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<(), StoreError> {
        self.store.set(KEY_ACCESS_TOKEN, access_token).await?;
        if let Some(refresh_token) = refresh_token.filter(|t| !t.trim().is_empty()) {
            self.store.set(KEY_REFRESH_TOKEN, refresh_token).await?;
        }
        Ok(())
    }

    pub async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        let json = serde_json::to_string(user)?;
        self.store.set(KEY_USER, &json).await
    }

    /// Cached profile. Unreadable or unparsable entries read as no user.
    pub async fn stored_user(&self) -> Option<User> {
        let raw = match self.store.get(KEY_USER).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "failed to read stored user");
                return None;
            }
        };
        serde_json::from_str(&raw).ok()
    }

    pub(crate) async fn clear_tokens(&self) -> Result<(), StoreError> {
        self.store
            .multi_remove(&[KEY_ACCESS_TOKEN, KEY_REFRESH_TOKEN])
            .await
    }

    /// Drops the session keys after a failed refresh. Applications stay.
    pub(crate) async fn expire(&self) -> Result<(), StoreError> {
        let result = self.store.multi_remove(&SESSION_KEYS).await;
        self.set_phase(SessionPhase::Expired).await;
        result
    }

    /// Removes every key, including the application list. Waits for any
    /// in-flight application write to land first.
    pub(crate) async fn clear_all(&self) -> Result<(), StoreError> {
        let _guard = self.applications_lock.lock().await;
        let result = self.store.multi_remove(&ALL_KEYS).await;
        self.set_phase(SessionPhase::Anonymous).await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, KEY_APPLICATIONS};

    fn session_with(store: &MemoryStore) -> Session {
        Session::new(Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn save_tokens_keeps_refresh_token_when_not_rotated() {
        let store = MemoryStore::new();
        let session = session_with(&store);

        session.save_tokens("a1", Some("r1")).await.unwrap();
        session.save_tokens("a2", None).await.unwrap();

        assert_eq!(session.access_token().await.unwrap().as_deref(), Some("a2"));
        assert_eq!(session.refresh_token().await.unwrap().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn expire_keeps_applications() {
        let store = MemoryStore::new();
        let session = session_with(&store);
        session.save_tokens("a", Some("r")).await.unwrap();
        store.set(KEY_USER, "{}").await.unwrap();
        store.set(KEY_APPLICATIONS, "[]").await.unwrap();

        session.expire().await.unwrap();

        assert_eq!(session.phase().await, SessionPhase::Expired);
        assert!(store.contains(KEY_APPLICATIONS).await);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn restore_reflects_persisted_token() {
        let store = MemoryStore::new();
        let session = session_with(&store);
        assert_eq!(session.restore().await.unwrap(), SessionPhase::Anonymous);

        store.set(KEY_ACCESS_TOKEN, "token").await.unwrap();
        assert_eq!(session.restore().await.unwrap(), SessionPhase::Authenticated);
    }

    #[tokio::test]
    async fn stored_user_ignores_garbage() {
        let store = MemoryStore::new();
        let session = session_with(&store);
        store.set(KEY_USER, "{not json").await.unwrap();
        assert!(session.stored_user().await.is_none());
    }
}
