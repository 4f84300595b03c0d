use async_trait::async_trait;
use serde::Serialize;
use crate::books::dto::{BookDto, BookForm, ImageUpload};
use crate::catalog::domain::CatalogService;
use crate::core::command::{Command, CommandError};

pub struct AddBookCommand {
    catalog_service: Box<dyn CatalogService>,
}

impl AddBookCommand {
    pub fn new(catalog_service: Box<dyn CatalogService>) -> Self {
        Self {
            catalog_service,
        }
    }
}

#[derive(Debug)]
pub struct AddBookCommandRequest {
    pub form: BookForm,
    pub image: Option<ImageUpload>,
}

impl AddBookCommandRequest {
    pub fn new(form: BookForm, image: Option<ImageUpload>) -> Self {
        Self {
            form,
            image,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddBookCommandResponse {
    pub book: BookDto,
}

impl AddBookCommandResponse {
    pub fn new(book: BookDto) -> Self {
        Self {
            book,
        }
    }
}

#[async_trait]
impl Command<AddBookCommandRequest, AddBookCommandResponse> for AddBookCommand {
    async fn execute(&self, req: AddBookCommandRequest) -> Result<AddBookCommandResponse, CommandError> {
        self.catalog_service.add_book(&req.form, req.image.as_ref())
            .await.map_err(CommandError::from).map(AddBookCommandResponse::new)
    }
}
