use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use lazy_static::lazy_static;
use tokio::sync::RwLock;
use crate::core::library::{LibraryError, LibraryResult};
use crate::storage::{BlobStore, content_key};

lazy_static! {
    // process-wide blob map shared by every store instance
    static ref SHARED_BLOBS: Arc<RwLock<HashMap<String, Vec<u8>>>> =
        Arc::new(RwLock::new(HashMap::new()));
}

// MemoryBlobStore backs the blob contract with a process-wide map; used by
// tests and dev mode
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    prefix: String,
}

impl MemoryBlobStore {
    pub fn new(prefix: &str) -> Self {
        Self {
            blobs: SHARED_BLOBS.clone(),
            prefix: prefix.to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bytes: &[u8], extension: &str) -> LibraryResult<String> {
        let key = content_key(self.prefix.as_str(), bytes, extension);
        let mut blobs = self.blobs.write().await;
        blobs.insert(key.clone(), bytes.to_vec());
        Ok(key)
    }

    async fn get(&self, key: &str) -> LibraryResult<Vec<u8>> {
        let blobs = self.blobs.read().await;
        blobs.get(key).cloned().ok_or_else(|| LibraryError::not_found(
            format!("blob not found for {}", key).as_str()))
    }

    async fn delete(&self, key: &str) -> LibraryResult<()> {
        let mut blobs = self.blobs.write().await;
        match blobs.remove(key) {
            Some(_) => Ok(()),
            None => Err(LibraryError::not_found(
                format!("blob not found for {}", key).as_str())),
        }
    }

    async fn exists(&self, key: &str) -> LibraryResult<bool> {
        let blobs = self.blobs.read().await;
        Ok(blobs.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use crate::core::library::LibraryError;
    use crate::storage::BlobStore;
    use crate::storage::memory_blob_store::MemoryBlobStore;

    #[tokio::test]
    async fn test_should_put_get_and_delete_blob() {
        let store = MemoryBlobStore::new("books");
        let key = store.put(b"memory cover", "png").await.expect("should store blob");
        assert!(key.starts_with("books/"));
        assert!(key.ends_with(".png"));

        let bytes = store.get(key.as_str()).await.expect("should read blob");
        assert_eq!(b"memory cover".to_vec(), bytes);
        assert!(store.exists(key.as_str()).await.expect("should check blob"));

        store.delete(key.as_str()).await.expect("should delete blob");
        assert!(!store.exists(key.as_str()).await.expect("should check blob"));
    }

    #[tokio::test]
    async fn test_should_fail_get_of_missing_blob() {
        let store = MemoryBlobStore::new("books");
        let res = store.get("books/no-such-blob.png").await;
        assert!(matches!(res, Err(LibraryError::NotFound { message: _ })));
    }
}
