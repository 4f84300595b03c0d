use axum::extract::{Multipart, Path, Query, State};
use axum::extract::multipart::MultipartError;
use axum::response::Json;
use serde::Deserialize;
use serde_json::Value;
use crate::books::dto::{BookDto, BookForm, ImageUpload};
use crate::catalog::command::add_book_cmd::{AddBookCommand, AddBookCommandRequest};
use crate::catalog::command::get_book_cmd::{GetBookCommand, GetBookCommandRequest};
use crate::catalog::command::list_books_cmd::{BookPageDto, ListBooksCommand, ListBooksCommandRequest};
use crate::catalog::command::remove_book_cmd::{RemoveBookCommand, RemoveBookCommandRequest};
use crate::catalog::command::update_book_cmd::{UpdateBookCommand, UpdateBookCommandRequest};
use crate::catalog::domain::CatalogService;
use crate::catalog::factory;
use crate::core::command::{Command, CommandError};
use crate::core::controller::{ApiResponse, AppState, ServerError};

async fn build_service(state: &AppState) -> Box<dyn CatalogService> {
    factory::create_catalog_service(&state.config, state.store, state.blobs).await
}

fn multipart_to_server_error(err: MultipartError) -> ServerError {
    ServerError(CommandError::Serialization { message: format!("{}", err) })
}

// pulls the book fields and the optional `image` file part out of a
// multipart body; unknown parts are ignored
async fn read_book_form(multipart: &mut Multipart) -> Result<(BookForm, Option<ImageUpload>), ServerError> {
    let mut form = BookForm::default();
    let mut image = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_to_server_error)? {
        let name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        if name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(multipart_to_server_error)?;
            if !file_name.is_empty() || !bytes.is_empty() {
                image = Some(ImageUpload::new(file_name.as_str(), bytes.to_vec()));
            }
        } else {
            let text = field.text().await.map_err(multipart_to_server_error)?;
            form.set_field(name.as_str(), text);
        }
    }
    Ok((form, image))
}

#[derive(Debug, Deserialize)]
pub struct ListBooksParams {
    pub page: Option<String>,
    pub search: Option<String>,
}

pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<ListBooksParams>) -> Result<Json<ApiResponse<BookPageDto>>, ServerError> {
    let svc = build_service(&state).await;
    let res = ListBooksCommand::new(svc).execute(ListBooksCommandRequest {
        page: params.page,
        search: params.search,
    }).await?;
    Ok(Json(ApiResponse::ok("book list data", res.books)))
}

pub async fn create_book(
    State(state): State<AppState>,
    mut multipart: Multipart) -> Result<Json<ApiResponse<BookDto>>, ServerError> {
    let (form, image) = read_book_form(&mut multipart).await?;
    let svc = build_service(&state).await;
    let res = AddBookCommand::new(svc).execute(AddBookCommandRequest::new(form, image)).await?;
    Ok(Json(ApiResponse::ok("book saved", res.book)))
}

pub async fn find_book_by_id(
    State(state): State<AppState>,
    Path(book_id): Path<String>) -> Result<Json<ApiResponse<BookDto>>, ServerError> {
    let svc = build_service(&state).await;
    let res = GetBookCommand::new(svc).execute(GetBookCommandRequest { book_id }).await?;
    Ok(Json(ApiResponse::ok("book detail", res.book)))
}

pub async fn update_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
    mut multipart: Multipart) -> Result<Json<ApiResponse<BookDto>>, ServerError> {
    let (form, image) = read_book_form(&mut multipart).await?;
    let svc = build_service(&state).await;
    let res = UpdateBookCommand::new(svc)
        .execute(UpdateBookCommandRequest::new(book_id.as_str(), form, image)).await?;
    if res.changed {
        Ok(Json(ApiResponse::ok("book updated", res.book)))
    } else {
        // nothing changed; the contract reports this as a failed update
        Ok(Json(ApiResponse::failed("update failed")))
    }
}

pub async fn remove_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>) -> Result<Json<ApiResponse<Value>>, ServerError> {
    let svc = build_service(&state).await;
    let _ = RemoveBookCommand::new(svc).execute(RemoveBookCommandRequest { book_id }).await?;
    Ok(Json(ApiResponse::ok_none("book deleted")))
}
