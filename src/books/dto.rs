use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::books::domain::model::BookEntity;
use crate::core::domain::Identifiable;
use crate::utils::date::serializer;

// BookDto is a data transfer object for the catalog service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookDto {
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

impl Identifiable for BookDto {
    fn id(&self) -> String {
        self.book_id.to_string()
    }
}

impl From<&BookEntity> for BookDto {
    fn from(other: &BookEntity) -> Self {
        Self {
            book_id: other.book_id.to_string(),
            title: other.title.to_string(),
            synopsis: other.synopsis.to_string(),
            isbn: other.isbn.clone(),
            writer: other.writer.clone(),
            category: other.category.clone(),
            page_amount: other.page_amount,
            stock_amount: other.stock_amount,
            published: other.published.to_string(),
            image: other.image.to_string(),
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}

// BookForm carries the raw field values of a create/update request before
// validation; integers arrive as strings from the multipart form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookForm {
    pub title: Option<String>,
    pub synopsis: Option<String>,
    pub isbn: Option<String>,
    pub writer: Option<String>,
    pub category: Option<String>,
    pub page_amount: Option<String>,
    pub stock_amount: Option<String>,
    pub published: Option<String>,
}

impl BookForm {
    pub fn set_field(&mut self, name: &str, value: String) {
        match name {
            "title" => self.title = Some(value),
            "synopsis" => self.synopsis = Some(value),
            "isbn" => self.isbn = Some(value),
            "writer" => self.writer = Some(value),
            "category" => self.category = Some(value),
            "page_amount" => self.page_amount = Some(value),
            "stock_amount" => self.stock_amount = Some(value),
            "published" => self.published = Some(value),
            _ => {}
        }
    }
}

// ImageUpload carries an uploaded cover-image file part
#[derive(Debug, Clone)]
pub struct ImageUpload {
    // client-supplied name, used only to derive the extension
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            bytes,
        }
    }

    pub fn extension(&self) -> Option<String> {
        self.file_name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use crate::books::domain::model::BookEntity;
    use crate::books::dto::{BookDto, BookForm, ImageUpload};

    #[tokio::test]
    async fn test_should_convert_entity_to_dto() {
        let book = BookEntity::new("Dune", "A desert planet saga", "1965", "books/abc.jpg");
        let dto = BookDto::from(&book);
        assert_eq!(book.book_id, dto.book_id);
        assert_eq!(book.title, dto.title);
        assert_eq!(book.image, dto.image);
    }

    #[tokio::test]
    async fn test_should_set_form_fields() {
        let mut form = BookForm::default();
        form.set_field("title", "Dune".to_string());
        form.set_field("page_amount", "412".to_string());
        form.set_field("unknown", "ignored".to_string());
        assert_eq!(Some("Dune".to_string()), form.title);
        assert_eq!(Some("412".to_string()), form.page_amount);
    }

    #[tokio::test]
    async fn test_should_extract_extension() {
        let upload = ImageUpload::new("Cover.JPG", vec![0xff, 0xd8, 0xff]);
        assert_eq!(Some("jpg".to_string()), upload.extension());
        assert_eq!(None, ImageUpload::new("cover", vec![]).extension());
    }
}
