use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::Utc;
use lazy_static::lazy_static;
use tokio::sync::RwLock;
use crate::books::domain::model::BookEntity;
use crate::books::domain::normalize_title;
use crate::books::repository::BookRepository;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;

#[derive(Default)]
struct MemoryDb {
    rows: HashMap<String, BookEntity>,
    // normalized title -> book_id, the uniqueness constraint
    titles: HashMap<String, String>,
}

lazy_static! {
    // process-wide store shared by every repository instance, mirroring a
    // long-lived database connection
    static ref SHARED_DB: Arc<RwLock<MemoryDb>> = Arc::new(RwLock::new(MemoryDb::default()));
}

// MemoryBookRepository keeps books in a process-wide map guarded by a
// tokio RwLock; the write lock makes the title-uniqueness check atomic
// with the insert, so the store remains the arbiter of the constraint.
pub struct MemoryBookRepository {
    db: Arc<RwLock<MemoryDb>>,
}

impl MemoryBookRepository {
    pub fn new() -> Self {
        Self {
            db: SHARED_DB.clone(),
        }
    }
}

impl Default for MemoryBookRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository<BookEntity> for MemoryBookRepository {
    async fn create(&self, entity: &BookEntity) -> LibraryResult<usize> {
        let mut db = self.db.write().await;
        let title_key = normalize_title(entity.title.as_str());
        if db.rows.contains_key(entity.book_id.as_str()) {
            return Err(LibraryError::duplicate_key(
                format!("book already exists for {}", entity.book_id).as_str()));
        }
        if db.titles.contains_key(title_key.as_str()) {
            return Err(LibraryError::duplicate_key(
                format!("book title already taken {}", entity.title).as_str()));
        }
        db.titles.insert(title_key, entity.book_id.to_string());
        db.rows.insert(entity.book_id.to_string(), entity.clone());
        Ok(1)
    }

    async fn update(&self, entity: &BookEntity) -> LibraryResult<usize> {
        let mut db = self.db.write().await;
        let old = match db.rows.get(entity.book_id.as_str()) {
            Some(old) => old.clone(),
            None => {
                return Err(LibraryError::not_found(
                    format!("book not found for {}", entity.book_id).as_str()));
            }
        };
        let title_key = normalize_title(entity.title.as_str());
        if let Some(owner) = db.titles.get(title_key.as_str()) {
            if owner != entity.book_id.as_str() {
                return Err(LibraryError::duplicate_key(
                    format!("book title already taken {}", entity.title).as_str()));
            }
        }
        db.titles.remove(normalize_title(old.title.as_str()).as_str());
        db.titles.insert(title_key, entity.book_id.to_string());
        let mut updated = entity.clone();
        updated.updated_at = Utc::now().naive_utc();
        db.rows.insert(entity.book_id.to_string(), updated);
        Ok(1)
    }

    async fn get(&self, id: &str) -> LibraryResult<BookEntity> {
        let db = self.db.read().await;
        db.rows.get(id).cloned().ok_or_else(|| LibraryError::not_found(
            format!("book not found for {}", id).as_str()))
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        let mut db = self.db.write().await;
        match db.rows.remove(id) {
            Some(old) => {
                db.titles.remove(normalize_title(old.title.as_str()).as_str());
                Ok(1)
            }
            None => Err(LibraryError::not_found(
                format!("book not found for {}", id).as_str())),
        }
    }
}

#[async_trait]
impl BookRepository for MemoryBookRepository {
    async fn find_latest(&self, page: Option<&str>,
                         page_size: usize) -> LibraryResult<PaginatedResult<BookEntity>> {
        let db = self.db.read().await;
        let mut records: Vec<BookEntity> = db.rows.values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at)
            .then_with(|| b.book_id.cmp(&a.book_id)));

        let page_index = page.and_then(|p| p.parse::<usize>().ok()).unwrap_or(0);
        let start = page_index.saturating_mul(page_size);
        let has_more = records.len() > start + page_size;
        let records: Vec<BookEntity> = records.into_iter().skip(start).take(page_size).collect();
        let next_page = if has_more {
            Some((page_index + 1).to_string())
        } else {
            None
        };
        Ok(PaginatedResult::new(page, page_size, next_page, records))
    }

    async fn find_by_title(&self, title: &str) -> LibraryResult<Option<BookEntity>> {
        let db = self.db.read().await;
        let id = db.titles.get(normalize_title(title).as_str());
        Ok(id.and_then(|id| db.rows.get(id.as_str()).cloned()))
    }

    async fn count_by_image(&self, image: &str) -> LibraryResult<usize> {
        let db = self.db.read().await;
        Ok(db.rows.values().filter(|book| book.image == image).count())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;
    use crate::books::domain::model::BookEntity;
    use crate::books::repository::BookRepository;
    use crate::books::repository::memory_book_repository::MemoryBookRepository;
    use crate::core::library::LibraryError;
    use crate::core::repository::Repository;

    fn build_book(title: &str) -> BookEntity {
        BookEntity::new(title, "synopsis", "1999", "books/abc.jpg")
    }

    fn unique_title(prefix: &str) -> String {
        format!("{} {}", prefix, Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_should_create_and_get_book() {
        let repo = MemoryBookRepository::new();
        let book = build_book(unique_title("mem create").as_str());
        let _ = repo.create(&book).await.expect("should create book");

        let loaded = repo.get(book.book_id.as_str()).await.expect("should return book");
        assert_eq!(book.book_id, loaded.book_id);
        assert_eq!(book.title, loaded.title);
    }

    #[tokio::test]
    async fn test_should_reject_duplicate_title() {
        let repo = MemoryBookRepository::new();
        let title = unique_title("mem dup");
        let _ = repo.create(&build_book(title.as_str())).await.expect("should create book");

        let res = repo.create(&build_book(title.to_uppercase().as_str())).await;
        assert!(matches!(res, Err(LibraryError::DuplicateKey { message: _ })));
    }

    #[tokio::test]
    async fn test_should_allow_same_title_on_own_update() {
        let repo = MemoryBookRepository::new();
        let mut book = build_book(unique_title("mem own").as_str());
        let _ = repo.create(&book).await.expect("should create book");

        book.stock_amount = Some(5);
        let _ = repo.update(&book).await.expect("should update book");
        let loaded = repo.get(book.book_id.as_str()).await.expect("should return book");
        assert_eq!(Some(5), loaded.stock_amount);
    }

    #[tokio::test]
    async fn test_should_reject_update_taking_existing_title() {
        let repo = MemoryBookRepository::new();
        let taken = unique_title("mem taken");
        let _ = repo.create(&build_book(taken.as_str())).await.expect("should create book");

        let mut other = build_book(unique_title("mem other").as_str());
        let _ = repo.create(&other).await.expect("should create book");

        other.title = taken;
        let res = repo.update(&other).await;
        assert!(matches!(res, Err(LibraryError::DuplicateKey { message: _ })));
    }

    #[tokio::test]
    async fn test_should_fail_update_of_missing_book() {
        let repo = MemoryBookRepository::new();
        let res = repo.update(&build_book(unique_title("mem missing").as_str())).await;
        assert!(matches!(res, Err(LibraryError::NotFound { message: _ })));
    }

    #[tokio::test]
    async fn test_should_delete_book_and_release_title() {
        let repo = MemoryBookRepository::new();
        let title = unique_title("mem delete");
        let book = build_book(title.as_str());
        let _ = repo.create(&book).await.expect("should create book");

        let _ = repo.delete(book.book_id.as_str()).await.expect("should delete book");
        assert!(repo.get(book.book_id.as_str()).await.is_err());

        // title can be reused once the row is gone
        let _ = repo.create(&build_book(title.as_str())).await.expect("should reuse title");
    }

    #[tokio::test]
    async fn test_should_fail_delete_of_missing_book() {
        let repo = MemoryBookRepository::new();
        let res = repo.delete("no-such-id").await;
        assert!(matches!(res, Err(LibraryError::NotFound { message: _ })));
    }

    #[tokio::test]
    async fn test_should_find_by_title() {
        let repo = MemoryBookRepository::new();
        let title = unique_title("mem find");
        let book = build_book(title.as_str());
        let _ = repo.create(&book).await.expect("should create book");

        let found = repo.find_by_title(title.to_uppercase().as_str())
            .await.expect("should query title");
        assert_eq!(Some(book.book_id), found.map(|b| b.book_id));

        let missing = repo.find_by_title(unique_title("mem absent").as_str())
            .await.expect("should query title");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_should_count_rows_by_image_key() {
        let repo = MemoryBookRepository::new();
        let shared_key = format!("books/{}.jpg", Uuid::new_v4());

        let mut first = build_book(unique_title("mem count").as_str());
        first.image = shared_key.to_string();
        let _ = repo.create(&first).await.expect("should create book");

        let mut second = build_book(unique_title("mem count").as_str());
        second.image = shared_key.to_string();
        let _ = repo.create(&second).await.expect("should create book");

        assert_eq!(2, repo.count_by_image(shared_key.as_str()).await.expect("should count"));

        let _ = repo.delete(first.book_id.as_str()).await.expect("should delete book");
        assert_eq!(1, repo.count_by_image(shared_key.as_str()).await.expect("should count"));
        assert_eq!(0, repo.count_by_image("books/absent.jpg").await.expect("should count"));
    }

    #[tokio::test]
    async fn test_should_list_latest_first_with_fixed_page_size() {
        let repo = MemoryBookRepository::new();
        for _ in 0..9 {
            let _ = repo.create(&build_book(unique_title("mem list").as_str()))
                .await.expect("should create book");
        }

        let page = repo.find_latest(None, 8).await.expect("should list books");
        assert_eq!(8, page.records.len());
        assert_eq!(Some("1".to_string()), page.next_page);
        for pair in page.records.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }
}
