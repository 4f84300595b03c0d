use async_trait::async_trait;
use crate::books::domain::model::BookEntity;
use crate::books::dto::{BookDto, BookForm, ImageUpload};
use crate::books::repository::BookRepository;
use crate::catalog::domain::{BookUpdate, CatalogService};
use crate::catalog::domain::validator::{validate_book, ValidatedBook, ValidationMode};
use crate::core::domain::Configuration;
use crate::core::library::{FieldViolations, LibraryError, LibraryResult, PaginatedResult};
use crate::storage::BlobStore;

pub struct CatalogServiceImpl {
    config: Configuration,
    book_repository: Box<dyn BookRepository>,
    blob_store: Box<dyn BlobStore>,
}

impl CatalogServiceImpl {
    pub fn new(config: &Configuration, book_repository: Box<dyn BookRepository>,
               blob_store: Box<dyn BlobStore>) -> Self {
        Self {
            config: config.clone(),
            book_repository,
            blob_store,
        }
    }

    // id of the row currently holding the form's title, if any; feeds the
    // uniqueness pre-check so the violation joins the full 422 map
    async fn title_owner(&self, form: &BookForm) -> LibraryResult<Option<String>> {
        if let Some(title) = form.title.as_deref() {
            if !title.trim().is_empty() {
                let owner = self.book_repository.find_by_title(title).await?;
                return Ok(owner.map(|book| book.book_id));
            }
        }
        Ok(None)
    }

    async fn store_cover(&self, upload: &ImageUpload,
                         validated: &ValidatedBook) -> LibraryResult<String> {
        let extension = validated.image_extension.as_deref().ok_or_else(|| {
            LibraryError::runtime("image extension missing after validation", None)
        })?;
        self.blob_store.put(upload.bytes.as_slice(), extension).await
    }

    // covers are content-addressed, so byte-identical uploads share one blob;
    // the blob is only removed once no other row references the key.
    // `still_stored` is true while the releasing row's image attribute is
    // still present in the store and counts toward the reference total.
    async fn remove_cover_if_unused(&self, key: &str, still_stored: bool) {
        let own_refs = usize::from(still_stored);
        match self.book_repository.count_by_image(key).await {
            Ok(count) if count > own_refs => {}
            Ok(_) => {
                if let Err(err) = self.blob_store.delete(key).await {
                    tracing::warn!("failed to remove cover {}: {}", key, err);
                }
            }
            Err(err) => {
                tracing::warn!("failed to count rows for cover {}: {}", key, err);
            }
        }
    }
}

// write-time constraint rejection surfaces the same way as the pre-check;
// the store is the arbiter of the uniqueness race
fn title_taken_error() -> LibraryError {
    let mut violations = FieldViolations::new();
    violations.entry("title".to_string()).or_default()
        .push("The title has already been taken.".to_string());
    LibraryError::validation("book validation failed", violations)
}

#[async_trait]
impl CatalogService for CatalogServiceImpl {
    async fn list_books(&self, page: Option<&str>) -> LibraryResult<PaginatedResult<BookDto>> {
        let res = self.book_repository.find_latest(page, self.config.page_size).await?;
        let records = res.records.iter().map(BookDto::from).collect();
        Ok(PaginatedResult::new(res.page.as_deref(), res.page_size, res.next_page, records))
    }

    async fn add_book(&self, form: &BookForm,
                      image: Option<&ImageUpload>) -> LibraryResult<BookDto> {
        let owner = self.title_owner(form).await?;
        let validated = validate_book(form, image, &self.config, ValidationMode::Create,
                                      owner.as_deref(), None)
            .map_err(|violations| LibraryError::validation("book validation failed", violations))?;
        let upload = image.ok_or_else(|| {
            LibraryError::runtime("image missing after validation", None)
        })?;

        // blob before row, so a failed upload never leaves an orphan row
        let key = self.store_cover(upload, &validated).await?;
        let mut entity = BookEntity::new(validated.title.as_str(), validated.synopsis.as_str(),
                                         validated.published.as_str(), key.as_str());
        entity.isbn = validated.isbn;
        entity.writer = validated.writer;
        entity.category = validated.category;
        entity.page_amount = validated.page_amount;
        entity.stock_amount = validated.stock_amount;

        match self.book_repository.create(&entity).await {
            Ok(_) => Ok(BookDto::from(&entity)),
            Err(err) => {
                self.remove_cover_if_unused(key.as_str(), false).await;
                match err {
                    LibraryError::DuplicateKey { .. } => Err(title_taken_error()),
                    other => Err(other),
                }
            }
        }
    }

    async fn find_book_by_id(&self, id: &str) -> LibraryResult<BookDto> {
        self.book_repository.get(id).await.map(|b| BookDto::from(&b))
    }

    async fn update_book(&self, id: &str, form: &BookForm,
                         image: Option<&ImageUpload>) -> LibraryResult<BookUpdate> {
        let old = self.book_repository.get(id).await?;
        let owner = self.title_owner(form).await?;
        let validated = validate_book(form, image, &self.config, ValidationMode::Update,
                                      owner.as_deref(), Some(id))
            .map_err(|violations| LibraryError::validation("book validation failed", violations))?;

        let image_key = match image {
            Some(upload) => {
                // best-effort removal of the replaced cover; an orphaned
                // blob never blocks the row change
                self.remove_cover_if_unused(old.image.as_str(), true).await;
                self.store_cover(upload, &validated).await?
            }
            None => old.image.to_string(),
        };

        let mut entity = BookEntity {
            book_id: old.book_id.to_string(),
            title: validated.title,
            synopsis: validated.synopsis,
            isbn: validated.isbn,
            writer: validated.writer,
            category: validated.category,
            page_amount: validated.page_amount,
            stock_amount: validated.stock_amount,
            published: validated.published,
            image: image_key,
            created_at: old.created_at,
            updated_at: old.updated_at,
        };

        if entity.same_fields(&old) {
            return Ok(BookUpdate::Unchanged(BookDto::from(&old)));
        }
        entity.updated_at = chrono::Utc::now().naive_utc();
        match self.book_repository.update(&entity).await {
            Ok(_) => Ok(BookUpdate::Changed(BookDto::from(&entity))),
            Err(LibraryError::DuplicateKey { .. }) => Err(title_taken_error()),
            Err(other) => Err(other),
        }
    }

    async fn remove_book(&self, id: &str) -> LibraryResult<()> {
        let old = self.book_repository.get(id).await?;
        // best-effort: a failed blob removal never blocks the row delete
        self.remove_cover_if_unused(old.image.as_str(), true).await;
        self.book_repository.delete(id).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use async_once::AsyncOnce;
    use lazy_static::lazy_static;
    use uuid::Uuid;
    use crate::books::dto::{BookForm, ImageUpload};
    use crate::catalog::domain::{BookUpdate, CatalogService};
    use crate::catalog::factory;
    use crate::core::domain::Configuration;
    use crate::core::library::LibraryError;
    use crate::core::repository::{BlobStoreKind, RepositoryStore};
    use crate::storage::BlobStore;
    use crate::storage::memory_blob_store::MemoryBlobStore;

    lazy_static! {
        static ref SUT_SVC: AsyncOnce<Box<dyn CatalogService>> = AsyncOnce::new(async {
                factory::create_catalog_service(&Configuration::new("storage"),
                                                RepositoryStore::Memory,
                                                BlobStoreKind::Memory).await
            });
    }

    fn build_form(title: &str) -> BookForm {
        let mut form = BookForm::default();
        form.set_field("title", title.to_string());
        form.set_field("synopsis", "A desert planet saga".to_string());
        form.set_field("published", "1965".to_string());
        form
    }

    fn build_full_form(title: &str) -> BookForm {
        let mut form = build_form(title);
        form.set_field("isbn", "9780441172719".to_string());
        form.set_field("writer", "Frank Herbert".to_string());
        form.set_field("category", "fiction".to_string());
        form.set_field("page_amount", "412".to_string());
        form.set_field("stock_amount", "3".to_string());
        form
    }

    // unique bytes per call keep content-hash keys from colliding across tests
    fn jpg_image() -> ImageUpload {
        let mut bytes = vec![0xff, 0xd8, 0xff, 0xe0];
        bytes.extend_from_slice(Uuid::new_v4().as_bytes());
        ImageUpload::new("cover.jpg", bytes)
    }

    fn unique_title(prefix: &str) -> String {
        format!("{} {}", prefix, Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_should_add_book_and_store_cover() {
        let catalog_svc = SUT_SVC.get().await.clone();

        let title = unique_title("svc add");
        let book = catalog_svc.add_book(&build_form(title.as_str()), Some(&jpg_image()))
            .await.expect("should add book");
        assert_eq!(title, book.title);
        assert!(book.image.starts_with("books/"));
        assert!(book.image.ends_with(".jpg"));

        let blobs = MemoryBlobStore::new("books");
        assert!(blobs.exists(book.image.as_str()).await.expect("should check blob"));

        let loaded = catalog_svc.find_book_by_id(book.book_id.as_str())
            .await.expect("should return book");
        assert_eq!(book.book_id, loaded.book_id);
        assert_eq!(book.image, loaded.image);
    }

    #[tokio::test]
    async fn test_should_report_all_violations_and_write_nothing() {
        let catalog_svc = SUT_SVC.get().await.clone();

        let image = jpg_image();
        let res = catalog_svc.add_book(&BookForm::default(), None).await;
        match res {
            Err(LibraryError::Validation { violations, .. }) => {
                assert!(violations.contains_key("title"));
                assert!(violations.contains_key("synopsis"));
                assert!(violations.contains_key("published"));
                assert!(violations.contains_key("image"));
            }
            other => panic!("expected validation failure, got {:?}", other),
        }

        let blobs = MemoryBlobStore::new("books");
        let key = crate::storage::content_key("books", image.bytes.as_slice(), "jpg");
        assert!(!blobs.exists(key.as_str()).await.expect("should check blob"));
    }

    #[tokio::test]
    async fn test_should_reject_duplicate_title_on_add() {
        let catalog_svc = SUT_SVC.get().await.clone();

        let title = unique_title("svc dup");
        let _ = catalog_svc.add_book(&build_form(title.as_str()), Some(&jpg_image()))
            .await.expect("should add book");

        let res = catalog_svc.add_book(
            &build_form(title.to_uppercase().as_str()), Some(&jpg_image())).await;
        match res {
            Err(LibraryError::Validation { violations, .. }) => {
                assert_eq!(vec!["The title has already been taken.".to_string()],
                           violations["title"]);
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_should_fail_update_of_missing_book() {
        let catalog_svc = SUT_SVC.get().await.clone();

        let res = catalog_svc.update_book("no-such-id",
                                          &build_full_form("svc missing"), None).await;
        assert!(matches!(res, Err(LibraryError::NotFound { message: _ })));
    }

    #[tokio::test]
    async fn test_should_report_noop_update_as_unchanged() {
        let catalog_svc = SUT_SVC.get().await.clone();

        let title = unique_title("svc noop");
        let form = build_full_form(title.as_str());
        let book = catalog_svc.add_book(&form, Some(&jpg_image()))
            .await.expect("should add book");

        let res = catalog_svc.update_book(book.book_id.as_str(), &form, None)
            .await.expect("should run update");
        assert!(matches!(res, BookUpdate::Unchanged(_)));
        assert_eq!(book.book_id, res.book().book_id);
    }

    #[tokio::test]
    async fn test_should_update_fields_and_replace_cover() {
        let catalog_svc = SUT_SVC.get().await.clone();

        let title = unique_title("svc update");
        let book = catalog_svc.add_book(&build_full_form(title.as_str()), Some(&jpg_image()))
            .await.expect("should add book");

        let mut form = build_full_form(title.as_str());
        form.set_field("stock_amount", "9".to_string());
        let new_cover = jpg_image();
        let res = catalog_svc.update_book(book.book_id.as_str(), &form, Some(&new_cover))
            .await.expect("should update book");
        assert!(res.changed());
        let updated = res.book();
        assert_eq!(Some(9), updated.stock_amount);
        assert_ne!(book.image, updated.image);

        let blobs = MemoryBlobStore::new("books");
        assert!(blobs.exists(updated.image.as_str()).await.expect("should check blob"));
        assert!(!blobs.exists(book.image.as_str()).await.expect("should check blob"));
    }

    #[tokio::test]
    async fn test_should_require_every_field_on_update() {
        let catalog_svc = SUT_SVC.get().await.clone();

        let title = unique_title("svc strict");
        let book = catalog_svc.add_book(&build_form(title.as_str()), Some(&jpg_image()))
            .await.expect("should add book");

        // the create form alone is not enough for an update
        let res = catalog_svc.update_book(book.book_id.as_str(),
                                          &build_form(title.as_str()), None).await;
        match res {
            Err(LibraryError::Validation { violations, .. }) => {
                assert!(violations.contains_key("isbn"));
                assert!(violations.contains_key("writer"));
                assert!(violations.contains_key("category"));
                assert!(violations.contains_key("page_amount"));
                assert!(violations.contains_key("stock_amount"));
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_should_remove_book_and_cover() {
        let catalog_svc = SUT_SVC.get().await.clone();

        let title = unique_title("svc remove");
        let book = catalog_svc.add_book(&build_form(title.as_str()), Some(&jpg_image()))
            .await.expect("should add book");

        let _ = catalog_svc.remove_book(book.book_id.as_str()).await.expect("should remove book");
        assert!(catalog_svc.find_book_by_id(book.book_id.as_str()).await.is_err());

        let blobs = MemoryBlobStore::new("books");
        assert!(!blobs.exists(book.image.as_str()).await.expect("should check blob"));
    }

    #[tokio::test]
    async fn test_should_keep_shared_cover_until_last_reference() {
        let catalog_svc = SUT_SVC.get().await.clone();

        // byte-identical uploads resolve to one content-addressed blob
        let cover = jpg_image();
        let first = catalog_svc.add_book(&build_form(unique_title("svc share").as_str()),
                                         Some(&cover))
            .await.expect("should add book");
        let second = catalog_svc.add_book(&build_form(unique_title("svc share").as_str()),
                                          Some(&cover))
            .await.expect("should add book");
        assert_eq!(first.image, second.image);

        let blobs = MemoryBlobStore::new("books");
        let _ = catalog_svc.remove_book(first.book_id.as_str()).await.expect("should remove book");
        assert!(blobs.exists(second.image.as_str()).await.expect("should check blob"));

        let _ = catalog_svc.remove_book(second.book_id.as_str()).await.expect("should remove book");
        assert!(!blobs.exists(second.image.as_str()).await.expect("should check blob"));
    }

    #[tokio::test]
    async fn test_should_keep_shared_cover_on_replace() {
        let catalog_svc = SUT_SVC.get().await.clone();

        let cover = jpg_image();
        let first = catalog_svc.add_book(&build_full_form(unique_title("svc keep").as_str()),
                                         Some(&cover))
            .await.expect("should add book");
        let second = catalog_svc.add_book(&build_form(unique_title("svc keep").as_str()),
                                          Some(&cover))
            .await.expect("should add book");

        let res = catalog_svc.update_book(first.book_id.as_str(),
                                          &build_full_form(first.title.as_str()),
                                          Some(&jpg_image()))
            .await.expect("should update book");
        assert!(res.changed());
        assert_ne!(second.image, res.book().image);

        let blobs = MemoryBlobStore::new("books");
        assert!(blobs.exists(second.image.as_str()).await.expect("should check blob"));
    }

    #[tokio::test]
    async fn test_should_fail_remove_of_missing_book() {
        let catalog_svc = SUT_SVC.get().await.clone();

        let res = catalog_svc.remove_book("no-such-id").await;
        assert!(matches!(res, Err(LibraryError::NotFound { message: _ })));
    }

    #[tokio::test]
    async fn test_should_list_books_newest_first() {
        let catalog_svc = SUT_SVC.get().await.clone();

        for _ in 0..9 {
            let _ = catalog_svc.add_book(&build_form(unique_title("svc list").as_str()),
                                         Some(&jpg_image()))
                .await.expect("should add book");
        }

        let page = catalog_svc.list_books(None).await.expect("should list books");
        assert_eq!(8, page.records.len());
        assert_eq!(8, page.page_size);
        assert!(page.next_page.is_some());
        for pair in page.records.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }
}
