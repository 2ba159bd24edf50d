use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::auth::views::LoginViewDto;
use crate::features::files::dtos::FileListDto;
use crate::features::portal::router::View;
use crate::features::session::Role;

/// What the client should show right now
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PortalViewDto {
    pub view: View,
    pub authenticated: bool,
    /// Present once signed in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Login form, only on the login view
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<LoginViewDto>,
    /// Mounted file list, only on a dashboard
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<FileListDto>,
}
