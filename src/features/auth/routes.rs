use crate::features::auth::handlers;
use crate::features::portal::services::Portal;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Public auth routes (no session required)
pub fn public_routes(portal: Arc<Portal>) -> Router {
    Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/mode", post(handlers::toggle_mode))
        .with_state(portal)
}

/// Protected auth routes (require a signed-in session)
pub fn protected_routes(portal: Arc<Portal>) -> Router {
    Router::new()
        .route("/api/auth/me", get(handlers::get_me))
        .with_state(portal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::UploadConfig;
    use crate::core::middleware::auth_middleware;
    use crate::shared::test_helpers::{test_portal, MemoryBackend};
    use axum::http::StatusCode;
    use axum::middleware::from_fn_with_state;
    use axum_test::TestServer;
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::name::en::Name;
    use fake::Fake;
    use serde_json::{json, Value};

    async fn server() -> (TestServer, Arc<MemoryBackend>) {
        let backend = MemoryBackend::new();
        let portal = test_portal(&backend, UploadConfig::default()).await;
        let app = public_routes(portal.clone()).merge(
            protected_routes(portal.clone())
                .route_layer(from_fn_with_state(portal, auth_middleware)),
        );
        (TestServer::new(app).unwrap(), backend)
    }

    #[tokio::test]
    async fn test_register_then_login_as_coordinator() {
        let (server, _backend) = server().await;
        let email: String = SafeEmail().fake();
        let name: String = Name().fake();

        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "email": email,
                "password": "secret",
                "name": name,
                "role": "coordinator"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["data"]["role"], "coordinator");
        assert_eq!(body["data"]["signed_in"], false);

        let response = server
            .post("/api/auth/login")
            .json(&json!({ "email": email, "password": "secret" }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["view"], "coordinator_dashboard");
        assert_eq!(body["data"]["files"]["title"], "Coordinator Panel");

        let body: Value = server.get("/api/auth/me").await.json();
        assert_eq!(body["data"]["name"], name.as_str());
        assert_eq!(body["data"]["role"], "coordinator");
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let (server, backend) = server().await;
        backend.seed_user("prof@escola.br", "secret", None);

        let response = server
            .post("/api/auth/login")
            .json(&json!({ "email": "prof@escola.br", "password": "wrong" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["message"], "Invalid login credentials");

        server
            .get("/api/auth/me")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (server, _backend) = server().await;

        let response = server
            .post("/api/auth/register")
            .json(&json!({ "email": "nope", "password": "", "name": "" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_rejected() {
        let (server, backend) = server().await;
        backend.seed_user("prof@escola.br", "secret", None);

        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "email": "prof@escola.br",
                "password": "secret",
                "name": "Bia"
            }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["message"], "User already registered");
    }

    #[tokio::test]
    async fn test_toggle_mode() {
        let (server, _backend) = server().await;

        let body: Value = server.post("/api/auth/mode").await.json();
        assert_eq!(body["data"]["mode"], "sign_up");
        let body: Value = server.post("/api/auth/mode").await.json();
        assert_eq!(body["data"]["mode"], "sign_in");
    }
}
