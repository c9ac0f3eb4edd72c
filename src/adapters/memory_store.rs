//! In-process blob store for development and tests.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{Hc50Error, Result, StorageFailure};
use crate::storage::{validate_key, BlobStore};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: DashMap<String, StoredObject>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.get(key).map(|o| o.content_type.clone())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch_bytes(&self, key: &str) -> Result<Vec<u8>> {
        validate_key(key)?;
        self.objects
            .get(key)
            .map(|o| o.bytes.clone())
            .ok_or_else(|| Hc50Error::storage_fetch(key, StorageFailure::NotFound, "no such key"))
    }

    async fn put_bytes(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        validate_key(key).map_err(|e| Hc50Error::StorageWrite {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.objects.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{upload_key, CSV_CONTENT_TYPE};

    #[tokio::test]
    async fn stores_content_type() {
        let store = MemoryBlobStore::new();
        let key = upload_key();
        store
            .put_bytes(&key, b"a,b,c".to_vec(), CSV_CONTENT_TYPE)
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.content_type(&key).as_deref(), Some("text/csv"));
        assert_eq!(store.fetch_bytes(&key).await.unwrap(), b"a,b,c");
    }

    #[tokio::test]
    async fn missing_key() {
        let store = MemoryBlobStore::new();
        let err = store.fetch_bytes("nope.csv").await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
