pub mod ddb_book_repository;
pub mod memory_book_repository;

use async_trait::async_trait;
use crate::books::domain::model::BookEntity;
use crate::core::library::{LibraryResult, PaginatedResult};
use crate::core::repository::Repository;

#[async_trait]
pub trait BookRepository: Repository<BookEntity> {
    // lists books newest-first
    async fn find_latest(&self, page: Option<&str>,
                         page_size: usize) -> LibraryResult<PaginatedResult<BookEntity>>;

    // looks up a book by its normalized title, for uniqueness pre-checks
    async fn find_by_title(&self, title: &str) -> LibraryResult<Option<BookEntity>>;

    // counts the rows referencing a cover-image key; content-addressed keys
    // can be shared by byte-identical uploads
    async fn count_by_image(&self, image: &str) -> LibraryResult<usize>;
}
