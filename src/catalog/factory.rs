use crate::books::factory as books_factory;
use crate::catalog::domain::CatalogService;
use crate::catalog::domain::service::CatalogServiceImpl;
use crate::core::domain::Configuration;
use crate::core::repository::{BlobStoreKind, RepositoryStore};
use crate::storage::factory as storage_factory;

pub async fn create_catalog_service(config: &Configuration, store: RepositoryStore,
                                    blobs: BlobStoreKind) -> Box<dyn CatalogService> {
    let book_repo = books_factory::create_book_repository(store).await;
    let blob_store = storage_factory::create_blob_store(config, blobs);
    Box::new(CatalogServiceImpl::new(config, book_repo, blob_store))
}
