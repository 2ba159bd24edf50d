use axum::{extract::State, Json};
use std::sync::Arc;

use crate::features::portal::dtos::PortalViewDto;
use crate::features::portal::services::Portal;
use crate::shared::types::ApiResponse;

/// Current view
///
/// Runs the router against the latest session. On first entry to a dashboard its
/// file list is fetched once.
#[utoipa::path(
    get,
    path = "/api/portal",
    tag = "portal",
    responses(
        (status = 200, description = "View for the current session", body = ApiResponse<PortalViewDto>)
    )
)]
pub async fn get_portal(State(portal): State<Arc<Portal>>) -> Json<ApiResponse<PortalViewDto>> {
    Json(ApiResponse::success(Some(portal.render().await), None, None))
}
