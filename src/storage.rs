pub mod factory;
pub mod fs_blob_store;
pub mod memory_blob_store;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use crate::core::library::LibraryResult;

// BlobStore abstracts content-addressed storage for book cover images.
// Keys are derived from a hash of the file bytes, never from user-supplied
// filenames, and live under a fixed logical prefix.
#[async_trait]
pub trait BlobStore: Sync + Send {
    // stores the bytes and returns the content-hash derived key
    async fn put(&self, bytes: &[u8], extension: &str) -> LibraryResult<String>;

    // fetches the bytes for a key
    async fn get(&self, key: &str) -> LibraryResult<Vec<u8>>;

    // removes the blob for a key
    async fn delete(&self, key: &str) -> LibraryResult<()>;

    // checks whether a key resolves to a stored blob
    async fn exists(&self, key: &str) -> LibraryResult<bool>;
}

// builds a blob key like "books/<sha256-hex>.<ext>" from the file bytes
pub fn content_key(prefix: &str, bytes: &[u8], extension: &str) -> String {
    let digest = Sha256::digest(bytes);
    format!("{}/{:x}.{}", prefix, digest, extension)
}
