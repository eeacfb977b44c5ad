use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StorageError;

type Result<T> = std::result::Result<T, StorageError>;

/// Keys of the persisted portal state
pub mod keys {
    pub const AUTH_TOKEN: &str = "authToken";
    pub const USER_DATA: &str = "userData";
    pub const RFI_NOTES: &str = "rfiNotes";
}

/// Trait for the small key/value state that survives between requests
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory implementation of LocalStore
#[derive(Default)]
pub struct InMemoryLocalStore {
    entries: Arc<DashMap<String, Value>>,
}

impl InMemoryLocalStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }
}

#[async_trait]
impl LocalStore for InMemoryLocalStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).map(|entry| entry.clone()))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// LocalStore backed by a single JSON object on disk.
///
/// Every write rewrites the whole file through a sibling `.tmp` file that is
/// renamed over it, so the state file is never left half written. A missing
/// file reads as empty.
pub struct FileLocalStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileLocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file a write lands in before it replaces the state file.
    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        PathBuf::from(staging)
    }

    async fn load(&self) -> Result<Map<String, Value>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Map::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, entries: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(entries)?;
        let staging = self.staging_path();
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        debug!(path = %self.path.display(), keys = entries.len(), "Wrote local state");
        Ok(())
    }
}

#[async_trait]
impl LocalStore for FileLocalStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value);
        self.write(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.write(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryLocalStore::new();
        store.set(keys::AUTH_TOKEN, json!("tok")).await.unwrap();
        assert_eq!(store.get(keys::AUTH_TOKEN).await.unwrap(), Some(json!("tok")));

        store.remove(keys::AUTH_TOKEN).await.unwrap();
        assert_eq!(store.get(keys::AUTH_TOKEN).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = FileLocalStore::new(&path);
        assert_eq!(store.get(keys::USER_DATA).await.unwrap(), None);
        store.set(keys::USER_DATA, json!({"name": "Ann"})).await.unwrap();
        store.set(keys::RFI_NOTES, json!({"C1": "send scans"})).await.unwrap();

        let reopened = FileLocalStore::new(&path);
        assert_eq!(
            reopened.get(keys::USER_DATA).await.unwrap(),
            Some(json!({"name": "Ann"}))
        );

        reopened.remove(keys::USER_DATA).await.unwrap();
        assert_eq!(store.get(keys::USER_DATA).await.unwrap(), None);
        assert_eq!(
            store.get(keys::RFI_NOTES).await.unwrap(),
            Some(json!({"C1": "send scans"}))
        );
    }

    #[tokio::test]
    async fn test_interrupted_write_leaves_state_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = FileLocalStore::new(&path);
        store.set(keys::AUTH_TOKEN, json!("tok")).await.unwrap();
        assert!(!store.staging_path().exists());

        // A crash after the staging write but before the rename.
        tokio::fs::write(store.staging_path(), b"{\"authTok").await.unwrap();
        assert_eq!(store.get(keys::AUTH_TOKEN).await.unwrap(), Some(json!("tok")));

        store.set(keys::USER_DATA, json!({"name": "Ann"})).await.unwrap();
        assert!(!store.staging_path().exists());
        let reopened = FileLocalStore::new(&path);
        assert_eq!(reopened.get(keys::AUTH_TOKEN).await.unwrap(), Some(json!("tok")));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let store = FileLocalStore::new(&path);
        assert!(matches!(
            store.get(keys::AUTH_TOKEN).await,
            Err(StorageError::Serialization(_))
        ));
    }
}
