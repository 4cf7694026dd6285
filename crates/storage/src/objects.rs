//! Object storage for profile pictures.
//!
//! Keys are flat file names such as `42.png`; the public URL is the store's
//! base URL joined with the key.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::repository::StorageError;

#[async_trait]
pub trait AvatarStore: Send + Sync {
    /// Write (or overwrite) an object and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the key is invalid or the write fails.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the read fails.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Public URL for a key, whether or not it exists yet.
    fn public_url(&self, key: &str) -> String;
}

fn check_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::Serialization(format!("invalid object key: {key}")))
    }
}

fn join_url(base: &str, key: &str) -> String {
    format!("{}/{key}", base.trim_end_matches('/'))
}

/// Stores avatars as files in a directory.
#[derive(Debug, Clone)]
pub struct FsAvatarStore {
    dir: PathBuf,
    public_base_url: String,
}

impl FsAvatarStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.into(),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}

#[async_trait]
impl AvatarStore for FsAvatarStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError> {
        check_key(key)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        tokio::fs::write(self.dir.join(key), bytes)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        tracing::debug!(key, bytes = bytes.len(), "stored avatar");
        Ok(self.public_url(key))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        check_key(key)?;
        match tokio::fs::read(self.dir.join(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Connection(e.to_string())),
        }
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }
}

/// Avatar store kept in memory, for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAvatarStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    public_base_url: String,
}

impl InMemoryAvatarStore {
    #[must_use]
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            objects: Arc::default(),
            public_base_url: public_base_url.into(),
        }
    }
}

#[async_trait]
impl AvatarStore for InMemoryAvatarStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError> {
        check_key(key)?;
        self.objects
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .insert(key.to_string(), bytes.to_vec());
        Ok(self.public_url(key))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let guard = self
            .objects
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fs_store_overwrites_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAvatarStore::new(dir.path().join("avatars"), "https://cdn.test/avatars/");

        let url = store.put("7.png", b"first").await.unwrap();
        assert_eq!(url, "https://cdn.test/avatars/7.png");
        store.put("7.png", b"second").await.unwrap();

        assert_eq!(store.get("7.png").await.unwrap().as_deref(), Some(&b"second"[..]));
        assert_eq!(store.get("8.png").await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejects_path_like_keys() {
        let store = InMemoryAvatarStore::new("mem://avatars");
        assert!(store.put("../escape.png", b"x").await.is_err());
        assert!(store.put("a/b.png", b"x").await.is_err());
        assert_eq!(store.put("1.jpg", b"x").await.unwrap(), "mem://avatars/1.jpg");
    }
}
