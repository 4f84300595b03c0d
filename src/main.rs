use std::net::SocketAddr;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use pustaka::catalog::controller::{create_book, find_book_by_id, list_books, remove_book, update_book};
use pustaka::core::controller::AppState;
use pustaka::core::repository::{BlobStoreKind, RepositoryStore};
use pustaka::utils::ddb::setup_tracing;

const DEV_MODE: bool = true;

// uploads may carry a cover image of up to 2000 kilobytes plus the text fields
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    let state = if DEV_MODE {
        AppState::new("storage", RepositoryStore::LocalDynamoDB, BlobStoreKind::FileSystem)
    } else {
        AppState::new("storage", RepositoryStore::DynamoDB, BlobStoreKind::FileSystem)
    };

    let app = Router::new()
        .route("/books",
               get(list_books).post(create_book))
        .route("/books/:id",
               get(find_book_by_id).put(update_book).patch(update_book).delete(remove_book))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state);

    let port = std::env::var("PORT").ok()
        .and_then(|port| port.parse::<u16>().ok()).unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);
    axum::Server::bind(&addr).serve(app.into_make_service()).await?;
    Ok(())
}
