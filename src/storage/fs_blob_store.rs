use std::path::{Path, PathBuf};
use async_trait::async_trait;
use crate::core::library::{LibraryError, LibraryResult};
use crate::storage::{BlobStore, content_key};

// FsBlobStore keeps blobs as files below a root directory; the relative
// path of each file is its key, e.g. `<root>/books/<hash>.jpg`
pub struct FsBlobStore {
    root: PathBuf,
    prefix: String,
}

impl FsBlobStore {
    pub fn new(root: &str, prefix: &str) -> Self {
        Self {
            root: PathBuf::from(root),
            prefix: prefix.to_string(),
        }
    }

    // keys are produced by this store, never by callers; reject anything
    // that could escape the root
    fn blob_path(&self, key: &str) -> LibraryResult<PathBuf> {
        let path = Path::new(key);
        let traversal = path.components().any(|c| {
            !matches!(c, std::path::Component::Normal(_))
        });
        // the key must sit inside the prefix directory itself, not merely
        // share its leading characters
        if traversal || !key.starts_with(format!("{}/", self.prefix).as_str()) {
            return Err(LibraryError::storage(
                format!("invalid blob key {}", key).as_str()));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, bytes: &[u8], extension: &str) -> LibraryResult<String> {
        let key = content_key(self.prefix.as_str(), bytes, extension);
        let path = self.blob_path(key.as_str())?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        Ok(key)
    }

    async fn get(&self, key: &str) -> LibraryResult<Vec<u8>> {
        let path = self.blob_path(key)?;
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(LibraryError::not_found(
                    format!("blob not found for {}", key).as_str()))
            }
            Err(err) => Err(LibraryError::from(err)),
        }
    }

    async fn delete(&self, key: &str) -> LibraryResult<()> {
        let path = self.blob_path(key)?;
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(LibraryError::not_found(
                    format!("blob not found for {}", key).as_str()))
            }
            Err(err) => Err(LibraryError::from(err)),
        }
    }

    async fn exists(&self, key: &str) -> LibraryResult<bool> {
        let path = self.blob_path(key)?;
        Ok(tokio::fs::try_exists(path).await?)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::library::LibraryError;
    use crate::storage::BlobStore;
    use crate::storage::fs_blob_store::FsBlobStore;

    fn build_store() -> FsBlobStore {
        let root = std::env::temp_dir().join(format!("pustaka-blobs-{}", uuid::Uuid::new_v4()));
        FsBlobStore::new(root.to_str().unwrap(), "books")
    }

    #[tokio::test]
    async fn test_should_put_get_and_delete_blob() {
        let store = build_store();
        let key = store.put(b"cover bytes", "jpg").await.expect("should store blob");
        assert!(key.starts_with("books/"));
        assert!(store.exists(key.as_str()).await.expect("should check blob"));

        let bytes = store.get(key.as_str()).await.expect("should read blob");
        assert_eq!(b"cover bytes".to_vec(), bytes);

        store.delete(key.as_str()).await.expect("should delete blob");
        assert!(!store.exists(key.as_str()).await.expect("should check blob"));
    }

    #[tokio::test]
    async fn test_should_fail_delete_of_missing_blob() {
        let store = build_store();
        let res = store.delete("books/no-such-blob.jpg").await;
        assert!(matches!(res, Err(LibraryError::NotFound { message: _ })));
    }

    #[tokio::test]
    async fn test_should_reject_traversal_key() {
        let store = build_store();
        let res = store.get("../../etc/passwd").await;
        assert!(matches!(res, Err(LibraryError::Storage { message: _ })));
    }

    #[tokio::test]
    async fn test_should_reject_key_outside_prefix_directory() {
        let store = build_store();
        let res = store.get("booksX/cover.jpg").await;
        assert!(matches!(res, Err(LibraryError::Storage { message: _ })));

        let res = store.get("books").await;
        assert!(matches!(res, Err(LibraryError::Storage { message: _ })));
    }
}
