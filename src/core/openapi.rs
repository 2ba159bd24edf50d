use utoipa::{Modify, OpenApi};

use crate::features::auth::{self, dtos as auth_dtos, views as auth_views};
use crate::features::files::{dtos as files_dtos, handlers as files_handlers};
use crate::features::portal::{dtos as portal_dtos, handlers as portal_handlers, router};
use crate::features::session::Role;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Portal
        portal_handlers::get_portal,
        // Auth
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::logout,
        auth::handlers::toggle_mode,
        auth::handlers::get_me,
        // Files
        files_handlers::list_files,
        files_handlers::upload_file,
        files_handlers::delete_file,
    ),
    components(
        schemas(
            // Common
            Meta,
            Role,
            ApiResponse<portal_dtos::PortalViewDto>,
            ApiResponse<auth_dtos::RegisterResponseDto>,
            ApiResponse<auth_dtos::MeResponseDto>,
            ApiResponse<auth_views::LoginViewDto>,
            ApiResponse<files_dtos::FileListDto>,
            ApiResponse<files_dtos::UploadedFileDto>,
            ApiResponse<files_dtos::DeleteFileResponseDto>,
            // Portal
            router::View,
            portal_dtos::PortalViewDto,
            // Auth
            auth_dtos::RegisterRequestDto,
            auth_dtos::LoginRequestDto,
            auth_dtos::RegisterResponseDto,
            auth_dtos::MeResponseDto,
            auth_views::LoginMode,
            auth_views::LoginViewDto,
            // Files
            files_dtos::FileListVariant,
            files_dtos::FileRowDto,
            files_dtos::FileListDto,
            files_dtos::UploadFileDto,
            files_dtos::UploadedFileDto,
            files_dtos::DeleteFileResponseDto,
        )
    ),
    tags(
        (name = "portal", description = "Current view for the signed-in session"),
        (name = "auth", description = "Sign-in, sign-up and sign-out"),
        (name = "files", description = "Shared class files (upload and delete for coordinators)"),
    ),
    info(
        title = "Classfiles Portal API",
        version = "0.1.0",
        description = "API documentation for the Classfiles Portal",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_portal_paths() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Portal".to_string(),
            version: "1.2.3".to_string(),
            description: "Docs".to_string(),
        }
        .modify(&mut doc);

        assert_eq!(doc.info.title, "Portal");
        for path in [
            "/api/portal",
            "/api/auth/login",
            "/api/auth/me",
            "/api/files",
            "/api/files/upload",
            "/api/files/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
