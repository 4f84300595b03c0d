use async_trait::async_trait;
use serde::Serialize;
use crate::books::dto::{BookDto, BookForm, ImageUpload};
use crate::catalog::domain::CatalogService;
use crate::core::command::{Command, CommandError};

pub struct UpdateBookCommand {
    catalog_service: Box<dyn CatalogService>,
}

impl UpdateBookCommand {
    pub fn new(catalog_service: Box<dyn CatalogService>) -> Self {
        Self {
            catalog_service,
        }
    }
}

#[derive(Debug)]
pub struct UpdateBookCommandRequest {
    pub book_id: String,
    pub form: BookForm,
    pub image: Option<ImageUpload>,
}

impl UpdateBookCommandRequest {
    pub fn new(book_id: &str, form: BookForm, image: Option<ImageUpload>) -> Self {
        Self {
            book_id: book_id.to_string(),
            form,
            image,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UpdateBookCommandResponse {
    pub book: BookDto,
    // false when the new values matched the row exactly
    pub changed: bool,
}

#[async_trait]
impl Command<UpdateBookCommandRequest, UpdateBookCommandResponse> for UpdateBookCommand {
    async fn execute(&self, req: UpdateBookCommandRequest) -> Result<UpdateBookCommandResponse, CommandError> {
        let res = self.catalog_service.update_book(req.book_id.as_str(), &req.form,
                                                   req.image.as_ref())
            .await.map_err(CommandError::from)?;
        Ok(UpdateBookCommandResponse {
            changed: res.changed(),
            book: res.book().clone(),
        })
    }
}
