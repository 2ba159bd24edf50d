use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Which flavour of the file list is mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FileListVariant {
    /// Teachers: list with creation dates
    ReadOnly,
    /// Coordinators: list with upload and delete
    ReadWrite,
}

impl FileListVariant {
    pub fn title(&self) -> &'static str {
        match self {
            FileListVariant::ReadOnly => "Teacher Files",
            FileListVariant::ReadWrite => "Coordinator Panel",
        }
    }
}

/// Upload file request DTO for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler uses axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileDto {
    /// The file to upload
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

/// One rendered row of the file list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileRowDto {
    pub id: String,
    /// Original filename, shown as the link text
    pub name: String,
    pub url: String,
    /// Browsing context the link opens in
    #[schema(example = "_blank")]
    pub link_target: String,
    #[schema(example = "1.00 MB")]
    pub size_label: String,
    /// Creation date (read-only variant only)
    #[schema(example = "05/03/2024")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_label: Option<String>,
    /// Whether the row offers a delete action (read-write variant only)
    pub deletable: bool,
}

/// Rendered file list view
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileListDto {
    pub variant: FileListVariant,
    pub title: String,
    /// Last fetch failure, if the most recent fetch failed
    pub error: Option<String>,
    /// True while an upload is in flight; clients disable the upload control
    pub uploading: bool,
    pub files: Vec<FileRowDto>,
}

/// Response DTO for an upload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadedFileDto {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: u64,
    pub url: String,
    /// Storage key the object was written under
    pub key: String,
    /// The refreshed list
    pub list: FileListDto,
}

/// Response DTO for delete operations
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteFileResponseDto {
    /// Confirmation that the record was deleted
    pub deleted: bool,
    /// The list after local removal
    pub list: FileListDto,
}
