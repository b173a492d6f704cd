//! Guest-mode persistence
//!
//! Guests keep their collections, profile and watch history in a key-value
//! store holding one JSON document per key. Writes are last-writer-wins.
use std::{
    collections::HashMap,
    io::ErrorKind,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{AppError, AppResult};

pub const COLLECTIONS_KEY: &str = "moodflix_collections";
pub const PROFILE_KEY: &str = "moodflix_profile";
pub const WATCH_HISTORY_KEY: &str = "moodflix_watch_history";

#[async_trait::async_trait]
pub trait LocalStore: Send + Sync {
    async fn read(&self, key: &str) -> AppResult<Option<String>>;

    async fn write(&self, key: &str, value: &str) -> AppResult<()>;

    async fn remove(&self, key: &str) -> AppResult<()>;
}

/// Reads and decodes the document under `key`
pub async fn load_json<T: DeserializeOwned>(
    store: &dyn LocalStore,
    key: &str,
) -> AppResult<Option<T>> {
    match store.read(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Loads a document, falling back to the default when it is missing or
/// unreadable
pub async fn load_or_default<T: DeserializeOwned + Default>(
    store: &dyn LocalStore,
    key: &str,
) -> T {
    match load_json(store, key).await {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!(error = %e, key, "Discarding unreadable local data");
            T::default()
        }
    }
}

/// Encodes `value` up front so the returned future owns everything it needs
pub fn save_json<T: Serialize + ?Sized>(
    store: std::sync::Arc<dyn LocalStore>,
    key: &'static str,
    value: &T,
) -> impl std::future::Future<Output = AppResult<()>> {
    let encoded = serde_json::to_string(value).map_err(AppError::from);
    async move { store.write(key, &encoded?).await }
}

/// One `<key>.json` file per key under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

fn storage_error(action: &str, key: &str, e: std::io::Error) -> AppError {
    AppError::Storage(format!("Failed to {} '{}': {}", action, key, e))
}

#[async_trait::async_trait]
impl LocalStore for FileStore {
    async fn read(&self, key: &str) -> AppResult<Option<String>> {
        match tokio::fs::read_to_string(self.path(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("read", key, e)),
        }
    }

    /// Writes through a temporary file so a crash never leaves half a document
    async fn write(&self, key: &str, value: &str) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| storage_error("prepare", key, e))?;

        let path = self.path(key);
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, value)
            .await
            .map_err(|e| storage_error("write", key, e))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|e| storage_error("write", key, e))?;

        tracing::debug!(key, bytes = value.len(), "Local data saved");
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        match tokio::fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("remove", key, e)),
        }
    }
}

/// In-memory store; writes can be made to fail
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    fn check_writable(&self, key: &str) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Storage(format!("Storage for '{}' is unavailable", key)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl LocalStore for MemoryStore {
    async fn read(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.raw(key))
    }

    async fn write(&self, key: &str, value: &str) -> AppResult<()> {
        self.check_writable(key)?;
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.check_writable(key)?;
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
        Ok(())
    }
}
