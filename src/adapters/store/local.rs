//! Local filesystem blob store
//!
//! Keys map to paths below a root directory, one directory per `/`-separated
//! segment. Writes go to a temporary sibling first and are renamed into place,
//! so readers never see a half-written blob.

use super::BlobStore;
use crate::domain::{Result, StoreError};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// [`BlobStore`] rooted at a local directory
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Creates a store rooted at `root`; the directory is created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> std::result::Result<PathBuf, String> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(format!("key must be a relative path without '..': {key}"));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let write_error = |message: String| StoreError::Write {
            key: key.to_string(),
            message,
        };

        let path = self.path_for(key).map_err(write_error)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| write_error(e.to_string()))?;
        }

        let tmp = path.with_extension("csv.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| write_error(e.to_string()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| write_error(e.to_string()))?;

        tracing::debug!(key = %key, bytes = bytes.len(), "Wrote blob");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key).map_err(|message| StoreError::Read {
            key: key.to_string(),
            message,
        })?;

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound {
                key: key.to_string(),
            }
            .into()),
            Err(e) => Err(StoreError::Read {
                key: key.to_string(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key).map_err(|message| StoreError::Read {
            key: key.to_string(),
            message,
        })?;
        tokio::fs::try_exists(&path).await.map_err(|e| {
            StoreError::Read {
                key: key.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StrataError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_get() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path());

        store.put("Demo/Logs/Logs.csv", b"a,b\n").await.unwrap();

        assert_eq!(store.get("Demo/Logs/Logs.csv").await.unwrap(), b"a,b\n");
        assert!(store.exists("Demo/Logs/Logs.csv").await.unwrap());
        assert!(dir.path().join("Demo").join("Logs").join("Logs.csv").is_file());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path());

        store.put("k/v.csv", b"old").await.unwrap();
        store.put("k/v.csv", b"new").await.unwrap();
        assert_eq!(store.get("k/v.csv").await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_get_missing() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path());

        let err = store.get("Demo/nothing.csv").await.unwrap_err();
        assert!(matches!(err, StrataError::Store(StoreError::NotFound { .. })));
        assert!(!store.exists("Demo/nothing.csv").await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path());

        assert!(store.put("../outside.csv", b"x").await.is_err());
        assert!(store.put("/abs.csv", b"x").await.is_err());
        assert!(store.put("", b"x").await.is_err());
    }
}
