//! Role-based authorization guards for the portal.
//!
//! The session middleware places an `AuthenticatedUser` in the request extensions;
//! these guards extract it and check the role.
//!
//! Roles:
//! - coordinator: browse, upload and delete files
//! - teacher: browse files only (also the fallback for unknown roles)

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Guard for checking if user is a coordinator.
///
/// Only allows users whose metadata role is exactly "coordinator".
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireCoordinator(user): RequireCoordinator) { ... }
/// ```
pub struct RequireCoordinator(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireCoordinator
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

        if !user.is_coordinator() {
            return Err(AppError::Forbidden(
                "Coordinator access required".to_string(),
            ));
        }

        Ok(RequireCoordinator(user.clone()))
    }
}
