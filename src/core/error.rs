use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::modules::backend::BackendError;
use crate::shared::types::ApiResponse;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Missing or malformed startup configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Rejected credentials, duplicate sign-up, failed sign-out
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Table read failure
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Upload, insert or delete failure
    #[error("Mutation error: {0}")]
    Mutation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl AppError {
    /// Map a failed sign-in/up/out into the auth taxonomy
    pub fn auth(err: BackendError) -> Self {
        AppError::Auth(err.reason())
    }

    /// Map a failed table read into the fetch taxonomy
    pub fn fetch(err: BackendError) -> Self {
        AppError::Fetch(err.reason())
    }

    /// Map a failed upload/insert/delete into the mutation taxonomy
    pub fn mutation(err: BackendError) -> Self {
        AppError::Mutation(err.reason())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::Configuration(ref msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), None)
            }
            AppError::Auth(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::Fetch(ref msg) => {
                tracing::error!("Fetch error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg.clone(), None)
            }
            AppError::Mutation(ref msg) => {
                tracing::error!("Mutation error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg.clone(), None)
            }
            AppError::Validation(ref msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                Some(vec![msg.clone()]),
            ),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::Forbidden(ref msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
        };

        let body = Json(ApiResponse::<()>::error(Some(message), errors));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
