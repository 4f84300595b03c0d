use crate::core::domain::Configuration;
use crate::core::repository::BlobStoreKind;
use crate::storage::BlobStore;
use crate::storage::fs_blob_store::FsBlobStore;
use crate::storage::memory_blob_store::MemoryBlobStore;

pub fn create_blob_store(config: &Configuration, kind: BlobStoreKind) -> Box<dyn BlobStore> {
    match kind {
        BlobStoreKind::FileSystem => {
            Box::new(FsBlobStore::new(config.blob_root.as_str(), config.image_prefix.as_str()))
        }
        BlobStoreKind::Memory => {
            Box::new(MemoryBlobStore::new(config.image_prefix.as_str()))
        }
    }
}
