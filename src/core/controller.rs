use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::core::command::CommandError;
use crate::core::domain::Configuration;
use crate::core::repository::{BlobStoreKind, RepositoryStore};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppState {
    pub config: Configuration,
    pub store: RepositoryStore,
    pub blobs: BlobStoreKind,
}

impl AppState {
    pub fn new(blob_root: &str, store: RepositoryStore, blobs: BlobStoreKind) -> AppState {
        AppState {
            config: Configuration::new(blob_root),
            store,
            blobs,
        }
    }
}

// ApiResponse is the uniform response envelope for every non-422 response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: &str, data: T) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: Some(data),
        }
    }

    pub fn ok_none(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: None,
        }
    }

    pub fn failed(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            data: None,
        }
    }
}

#[derive(Debug)]
pub struct ServerError(pub CommandError);

impl From<CommandError> for ServerError {
    fn from(err: CommandError) -> Self {
        ServerError(err)
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self.0 {
            // validation failures return the bare field-error map
            CommandError::Validation { violations, .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(violations)).into_response()
            }
            CommandError::NotFound { message } => {
                (StatusCode::NOT_FOUND, Json(ApiResponse::<Value>::failed(message.as_str()))).into_response()
            }
            CommandError::DuplicateKey { message } => {
                (StatusCode::CONFLICT, Json(ApiResponse::<Value>::failed(message.as_str()))).into_response()
            }
            CommandError::Serialization { message } => {
                (StatusCode::BAD_REQUEST, Json(ApiResponse::<Value>::failed(message.as_str()))).into_response()
            }
            CommandError::Storage { message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::<Value>::failed(message.as_str()))).into_response()
            }
            CommandError::Database { message, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::<Value>::failed(message.as_str()))).into_response()
            }
            CommandError::Runtime { message, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::<Value>::failed(message.as_str()))).into_response()
            }
        }
    }
}
