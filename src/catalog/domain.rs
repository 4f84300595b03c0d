pub mod service;
pub mod validator;

use async_trait::async_trait;
use crate::books::dto::{BookDto, BookForm, ImageUpload};
use crate::core::library::{LibraryResult, PaginatedResult};

// BookUpdate keeps "nothing changed" distinct from a changed row; hard
// failures stay in LibraryError
#[derive(Debug, Clone, PartialEq)]
pub enum BookUpdate {
    Changed(BookDto),
    Unchanged(BookDto),
}

impl BookUpdate {
    pub fn book(&self) -> &BookDto {
        match self {
            BookUpdate::Changed(book) => book,
            BookUpdate::Unchanged(book) => book,
        }
    }

    pub fn changed(&self) -> bool {
        matches!(self, BookUpdate::Changed(_))
    }
}

#[async_trait]
pub trait CatalogService: Sync + Send {
    async fn list_books(&self, page: Option<&str>) -> LibraryResult<PaginatedResult<BookDto>>;
    async fn add_book(&self, form: &BookForm, image: Option<&ImageUpload>) -> LibraryResult<BookDto>;
    async fn find_book_by_id(&self, id: &str) -> LibraryResult<BookDto>;
    async fn update_book(&self, id: &str, form: &BookForm,
                         image: Option<&ImageUpload>) -> LibraryResult<BookUpdate>;
    async fn remove_book(&self, id: &str) -> LibraryResult<()>;
}
