use super::{KeyValueStore, StoreError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const DEFAULT_STORE_FILE: &str = "jobboard-store.json";

/// JSON-object file on disk, loaded once and rewritten in full on every
/// mutation.
#[derive(Clone)]
pub struct FileStore {
  path: Arc<PathBuf>,
  entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl FileStore {
  pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
    let path = path.as_ref().to_path_buf();
    let entries = match tokio::fs::read_to_string(&path).await {
      Ok(text) if text.trim().is_empty() => BTreeMap::new(),
      Ok(text) => serde_json::from_str(&text)?,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
      Err(e) => return Err(e.into()),
    };
    tracing::debug!(path = %path.display(), keys = entries.len(), "opened file store");

    Ok(Self {
      path: Arc::new(path),
      entries: Arc::new(Mutex::new(entries)),
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  async fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(parent).await?;
    }
    let data = serde_json::to_vec_pretty(entries)?;
    let tmp = self.path.with_extension("json.tmp");
    tokio::fs::write(&tmp, data).await?;
    tokio::fs::rename(&tmp, self.path.as_path()).await?;
    Ok(())
  }
}

#[async_trait]
impl KeyValueStore for FileStore {
  async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    Ok(self.entries.lock().await.get(key).cloned())
  }

  async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
    let mut guard = self.entries.lock().await;
    guard.insert(key.to_string(), value.to_string());
    self.save(&guard).await
  }

  async fn remove(&self, key: &str) -> Result<(), StoreError> {
    let mut guard = self.entries.lock().await;
    if guard.remove(key).is_none() {
      return Ok(());
    }
    self.save(&guard).await
  }

  async fn multi_remove(&self, keys: &[&str]) -> Result<(), StoreError> {
    let mut guard = self.entries.lock().await;
    let before = guard.len();
    for key in keys {
      guard.remove(*key);
    }
    if guard.len() == before {
      return Ok(());
    }
    self.save(&guard).await
  }
}
