use chrono::{NaiveDateTime, Utc};
use uuid::Uuid;
use serde::{Deserialize, Serialize};
use crate::core::domain::Identifiable;
use crate::utils::date::serializer;

// BookEntity abstracts a catalog entry in the library management system.
// The cover image lives in the blob store; `image` holds its key.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct BookEntity {
    pub book_id: String,
    pub title: String,
    pub synopsis: String,
    pub isbn: Option<String>,
    pub writer: Option<String>,
    pub category: Option<String>,
    pub page_amount: Option<i64>,
    pub stock_amount: Option<i64>,
    pub published: String,
    pub image: String,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl BookEntity {
    pub fn new(title: &str, synopsis: &str, published: &str, image: &str) -> Self {
        Self {
            book_id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            synopsis: synopsis.to_string(),
            isbn: None,
            writer: None,
            category: None,
            page_amount: None,
            stock_amount: None,
            published: published.to_string(),
            image: image.to_string(),
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    // compares the caller-mutable fields, ignoring store-managed timestamps
    pub fn same_fields(&self, other: &BookEntity) -> bool {
        self.title == other.title
            && self.synopsis == other.synopsis
            && self.isbn == other.isbn
            && self.writer == other.writer
            && self.category == other.category
            && self.page_amount == other.page_amount
            && self.stock_amount == other.stock_amount
            && self.published == other.published
            && self.image == other.image
    }
}

impl Identifiable for BookEntity {
    fn id(&self) -> String {
        self.book_id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use crate::books::domain::model::BookEntity;

    #[tokio::test]
    async fn test_should_build_books() {
        let book = BookEntity::new("Dune", "A desert planet saga", "1965", "books/abc.jpg");
        assert_eq!("Dune", book.title.as_str());
        assert_eq!("A desert planet saga", book.synopsis.as_str());
        assert_eq!("1965", book.published.as_str());
        assert_eq!("books/abc.jpg", book.image.as_str());
        assert_eq!(None, book.isbn);
    }

    #[tokio::test]
    async fn test_should_compare_fields() {
        let book = BookEntity::new("Dune", "A desert planet saga", "1965", "books/abc.jpg");
        let mut copy = book.clone();
        assert!(book.same_fields(&copy));

        copy.stock_amount = Some(3);
        assert!(!book.same_fields(&copy));
    }
}
