use crate::core::error::Result;
use crate::core::extractor::ValidatedJson;
use crate::features::auth::dtos::{
    LoginRequestDto, MeResponseDto, RegisterRequestDto, RegisterResponseDto,
};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::views::{LoginViewDto, REGISTERED_NOTICE};
use crate::features::portal::dtos::PortalViewDto;
use crate::features::portal::services::Portal;
use crate::modules::backend::SignUpOutcome;
use crate::shared::types::ApiResponse;
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

/// Register a new user
///
/// The role and full name are stored in the account metadata. Unless the
/// backend signs the user in right away, the form switches back to sign-in.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequestDto,
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<RegisterResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Registration rejected by the backend")
    ),
    tag = "auth"
)]
pub async fn register(
    State(portal): State<Arc<Portal>>,
    ValidatedJson(dto): ValidatedJson<RegisterRequestDto>,
) -> Result<(StatusCode, Json<ApiResponse<RegisterResponseDto>>)> {
    let outcome = portal
        .register(&dto.email, &dto.password, &dto.name, dto.role)
        .await?;

    let signed_in = matches!(outcome, SignUpOutcome::SignedIn(_));
    let user = outcome.user();
    let response = RegisterResponseDto {
        user_id: user.id.clone(),
        email: user.email.clone(),
        role: dto.role,
        signed_in,
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(response),
            Some(REGISTERED_NOTICE.to_string()),
            None,
        )),
    ))
}

/// Login with email and password
///
/// On failure the reason is also kept on the login form.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequestDto,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<PortalViewDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(portal): State<Arc<Portal>>,
    ValidatedJson(dto): ValidatedJson<LoginRequestDto>,
) -> Result<Json<ApiResponse<PortalViewDto>>> {
    let view = portal.login(&dto.email, &dto.password).await?;
    Ok(Json(ApiResponse::success(Some(view), None, None)))
}

/// Sign out
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Signed out", body = ApiResponse<PortalViewDto>),
        (status = 401, description = "Sign-out rejected by the backend")
    ),
    tag = "auth"
)]
pub async fn logout(State(portal): State<Arc<Portal>>) -> Result<Json<ApiResponse<PortalViewDto>>> {
    let view = portal.logout().await?;
    Ok(Json(ApiResponse::success(Some(view), None, None)))
}

/// Toggle the login form between sign-in and sign-up
#[utoipa::path(
    post,
    path = "/api/auth/mode",
    responses(
        (status = 200, description = "Form mode switched", body = ApiResponse<LoginViewDto>)
    ),
    tag = "auth"
)]
pub async fn toggle_mode(State(portal): State<Arc<Portal>>) -> Json<ApiResponse<LoginViewDto>> {
    Json(ApiResponse::success(Some(portal.toggle_mode()), None, None))
}

/// Get current authenticated user info
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user retrieved successfully", body = ApiResponse<MeResponseDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth"
)]
pub async fn get_me(user: AuthenticatedUser) -> Json<ApiResponse<MeResponseDto>> {
    Json(ApiResponse::success(Some(user.into()), None, None))
}
