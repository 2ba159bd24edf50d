use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{delete_file, list_files, upload_file};
use crate::features::portal::services::Portal;

/// Create routes for the files feature
pub fn routes(portal: Arc<Portal>) -> Router {
    let max_file_size = portal.file_service().max_file_size();

    Router::new()
        .route("/api/files", get(list_files))
        .route(
            "/api/files/upload",
            // Allow body size up to the file limit + buffer for multipart overhead
            post(upload_file).layer(DefaultBodyLimit::max(max_file_size + 1024 * 1024)),
        )
        .route("/api/files/{id}", delete(delete_file))
        .with_state(portal)
}
