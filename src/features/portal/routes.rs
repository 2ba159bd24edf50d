use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::portal::handlers::get_portal;
use crate::features::portal::services::Portal;

pub fn routes(portal: Arc<Portal>) -> Router {
    Router::new()
        .route("/api/portal", get(get_portal))
        .with_state(portal)
}
