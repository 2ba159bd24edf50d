use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;

use crate::core::error::AppError;
use crate::features::auth::guards::RequireCoordinator;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::{
    DeleteFileResponseDto, FileListDto, UploadFileDto, UploadedFileDto,
};
use crate::features::files::services::FileUpload;
use crate::features::portal::services::Portal;
use crate::shared::types::{ApiResponse, Meta};

/// List files
///
/// Re-fetches the mounted list, newest first. A failed fetch keeps the previous
/// rows and reports the reason in `error`.
#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    responses(
        (status = 200, description = "Rendered file list", body = ApiResponse<FileListDto>),
        (status = 401, description = "Sign in required")
    )
)]
pub async fn list_files(
    _user: AuthenticatedUser,
    State(portal): State<Arc<Portal>>,
) -> Result<Json<ApiResponse<FileListDto>>, AppError> {
    let list = portal.refresh_files().await?;
    let total = list.files.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(list),
        None,
        Some(Meta { total }),
    )))
}

/// Upload a file
///
/// Accepts multipart/form-data with exactly one `file` field. A second `file` part
/// rejects the whole request before anything is stored.
#[utoipa::path(
    post,
    path = "/api/files/upload",
    tag = "files",
    request_body(
        content = UploadFileDto,
        content_type = "multipart/form-data",
        description = "File upload form",
    ),
    responses(
        (status = 201, description = "File uploaded successfully", body = ApiResponse<UploadedFileDto>),
        (status = 400, description = "Invalid file, missing file or more than one file"),
        (status = 401, description = "Sign in required"),
        (status = 403, description = "Coordinator access required"),
        (status = 413, description = "File too large"),
        (status = 502, description = "Storage or table write failed")
    )
)]
pub async fn upload_file(
    RequireCoordinator(user): RequireCoordinator,
    State(portal): State<Arc<Portal>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<UploadedFileDto>>), AppError> {
    let mut upload: Option<FileUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();
        if field_name != "file" {
            debug!("Ignoring unknown field: {}", field_name);
            continue;
        }
        // Each selection is its own request; nothing is stored for a batch
        if upload.is_some() {
            return Err(AppError::BadRequest(
                "Only one file can be uploaded per request".to_string(),
            ));
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unnamed".to_string());
        let data = field.bytes().await.map_err(|e| {
            debug!("Failed to read file bytes: {}", e);
            AppError::BadRequest(format!("Failed to read file data: {}", e))
        })?;

        upload = Some(FileUpload {
            name,
            content_type,
            data: data.to_vec(),
        });
    }

    let upload = upload.ok_or_else(|| AppError::BadRequest("File is required".to_string()))?;
    debug!(
        "Upload of {} ({} bytes) by {}",
        upload.name,
        upload.data.len(),
        user.user_id
    );

    let (record, key, list) = portal.upload(upload).await?;

    let response = UploadedFileDto {
        id: record.id,
        name: record.name,
        content_type: record.content_type,
        size: record.size,
        url: record.url,
        key,
        list,
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(response), None, None)),
    ))
}

/// Delete a file record by id
///
/// The stored object is left in place; the row is dropped from the list without
/// re-fetching.
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "File record id")
    ),
    responses(
        (status = 200, description = "File deleted successfully", body = ApiResponse<DeleteFileResponseDto>),
        (status = 401, description = "Sign in required"),
        (status = 403, description = "Coordinator access required"),
        (status = 502, description = "Table delete failed")
    )
)]
pub async fn delete_file(
    RequireCoordinator(_user): RequireCoordinator,
    State(portal): State<Arc<Portal>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeleteFileResponseDto>>, AppError> {
    let list = portal.delete(&id).await?;

    Ok(Json(ApiResponse::success(
        Some(DeleteFileResponseDto {
            deleted: true,
            list,
        }),
        Some("File deleted successfully".to_string()),
        None,
    )))
}
