//! Filesystem-backed blob store rooted at a directory.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Hc50Error, Result, StorageFailure};
use crate::storage::{validate_key, BlobStore};

#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn fetch_bytes(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!(key, bytes = bytes.len(), "read blob from disk");
                Ok(bytes)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Hc50Error::storage_fetch(
                key,
                StorageFailure::NotFound,
                "no such file",
            )),
            Err(e) => Err(Hc50Error::storage_fetch(
                key,
                StorageFailure::Io,
                e.to_string(),
            )),
        }
    }

    async fn put_bytes(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<()> {
        let path = self.path_for(key).map_err(|e| Hc50Error::StorageWrite {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::CSV_CONTENT_TYPE;

    #[tokio::test]
    async fn put_then_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        store
            .put_bytes("nested/a.csv", b"id,y,x\n".to_vec(), CSV_CONTENT_TYPE)
            .await
            .unwrap();
        let bytes = store.fetch_bytes("nested/a.csv").await.unwrap();
        assert_eq!(bytes, b"id,y,x\n");
    }

    #[tokio::test]
    async fn missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        let err = store.fetch_bytes("missing.csv").await.unwrap_err();
        assert!(matches!(
            err,
            Hc50Error::StorageFetch {
                kind: StorageFailure::NotFound,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().join("uploads"));

        let err = store.fetch_bytes("../outside.csv").await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(store
            .put_bytes("../outside.csv", vec![], CSV_CONTENT_TYPE)
            .await
            .is_err());
    }
}
