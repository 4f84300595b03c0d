use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::books::dto::BookDto;
use crate::catalog::domain::CatalogService;
use crate::core::command::{Command, CommandError};
use crate::core::library::PaginatedResult;

pub struct ListBooksCommand {
    catalog_service: Box<dyn CatalogService>,
}

impl ListBooksCommand {
    pub fn new(catalog_service: Box<dyn CatalogService>) -> Self {
        Self {
            catalog_service,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListBooksCommandRequest {
    pub page: Option<String>,
    // echoed into the page payload, never used to filter
    pub search: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookPageDto {
    pub page: Option<String>,
    pub page_size: usize,
    pub next_page: Option<String>,
    pub search: Option<String>,
    pub records: Vec<BookDto>,
}

impl BookPageDto {
    fn new(res: PaginatedResult<BookDto>, search: Option<String>) -> Self {
        Self {
            page: res.page,
            page_size: res.page_size,
            next_page: res.next_page,
            search,
            records: res.records,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListBooksCommandResponse {
    pub books: BookPageDto,
}

#[async_trait]
impl Command<ListBooksCommandRequest, ListBooksCommandResponse> for ListBooksCommand {
    async fn execute(&self, req: ListBooksCommandRequest) -> Result<ListBooksCommandResponse, CommandError> {
        let res = self.catalog_service.list_books(req.page.as_deref())
            .await.map_err(CommandError::from)?;
        Ok(ListBooksCommandResponse {
            books: BookPageDto::new(res, req.search),
        })
    }
}
