use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, RwLock};

use crate::features::session::models::{Role, SessionState};
use crate::modules::backend::{
    AuthBackend, AuthEvent, BackendError, Session, SignUpOutcome, Subscription,
};
use crate::shared::constants::{NAME_METADATA_KEY, ROLE_METADATA_KEY};

/// Tracks the authenticated session and the role derived from it
pub struct SessionController {
    auth: Arc<dyn AuthBackend>,
    state: Arc<RwLock<SessionState>>,
    subscription: Mutex<Option<Subscription>>,
}

impl SessionController {
    pub fn new(auth: Arc<dyn AuthBackend>) -> Self {
        Self {
            auth,
            state: Arc::new(RwLock::new(SessionState::default())),
            subscription: Mutex::new(None),
        }
    }

    /// Probe the backend for an existing session, then follow its changes
    pub async fn start(&self) {
        match self.auth.get_session().await {
            Ok(session) => {
                tracing::info!("Startup session probe: authenticated={}", session.is_some());
                self.apply(session);
            }
            Err(e) => {
                tracing::warn!("Startup session probe failed: {}", e);
                self.write_state().probed = true;
            }
        }

        let state = Arc::clone(&self.state);
        let subscription = self.auth.on_auth_state_change(Arc::new(
            move |event: AuthEvent, session: Option<&Session>| {
                tracing::debug!(
                    "Session change {:?}: authenticated={}",
                    event,
                    session.is_some()
                );
                let next = SessionState::from_session(session.cloned());
                *state.write().unwrap_or_else(|e| e.into_inner()) = next;
            },
        ));

        // Replacing an earlier subscription drops, and so detaches, it
        *self.lock_subscription() = Some(subscription);
    }

    /// Detach from backend notifications; local state is frozen afterwards
    pub fn shutdown(&self) {
        if let Some(subscription) = self.lock_subscription().take() {
            subscription.unsubscribe();
            tracing::info!("Session controller unsubscribed");
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.lock_subscription().is_some()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Password sign-in; failures leave the local state untouched
    pub async fn login(&self, email: &str, password: &str) -> Result<(), BackendError> {
        let session = self.auth.sign_in_with_password(email, password).await?;
        self.apply_signed_in(session);
        Ok(())
    }

    /// Sign-out; failures leave the local state untouched
    pub async fn logout(&self) -> Result<(), BackendError> {
        self.auth.sign_out().await?;
        self.apply(None);
        Ok(())
    }

    /// Create an account carrying the chosen role and full name in its metadata
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: Role,
    ) -> Result<SignUpOutcome, BackendError> {
        let mut metadata = Map::new();
        metadata.insert(NAME_METADATA_KEY.to_string(), Value::from(name));
        metadata.insert(ROLE_METADATA_KEY.to_string(), Value::from(role.as_str()));
        self.auth
            .sign_up(email, password, Value::Object(metadata))
            .await
    }

    /// Store a freshly signed-in session unless the listener already holds a
    /// later one for the same user
    fn apply_signed_in(&self, session: Session) {
        let mut state = self.write_state();
        if let Some(current) = &state.session {
            if current.user.id == session.user.id && current.expires_at > session.expires_at {
                tracing::debug!("Keeping newer session for user {}", current.user.id);
                return;
            }
        }
        *state = SessionState::from_session(Some(session));
    }

    fn apply(&self, session: Option<Session>) {
        *self.write_state() = SessionState::from_session(session);
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_subscription(&self) -> std::sync::MutexGuard<'_, Option<Subscription>> {
        self.subscription
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{FailOn, MemoryBackend};
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;
    use tokio_test::{assert_err, assert_ok};

    fn controller(backend: &Arc<MemoryBackend>) -> SessionController {
        SessionController::new(backend.clone())
    }

    #[tokio::test]
    async fn test_initial_state_is_unauthenticated_until_probe() {
        let backend = MemoryBackend::new();
        let controller = controller(&backend);

        let state = controller.snapshot();
        assert!(!state.authenticated);
        assert!(!state.probed);

        controller.start().await;
        let state = controller.snapshot();
        assert!(!state.authenticated);
        assert!(state.probed);
        assert!(controller.is_subscribed());
    }

    #[tokio::test]
    async fn test_probe_picks_up_existing_session() {
        let backend = MemoryBackend::new();
        backend.seed_user("coord@escola.br", "secret", Some("coordinator"));
        let session = backend.session_for("coord@escola.br");
        backend.push_event(AuthEvent::SignedIn, session);

        let controller = controller(&backend);
        controller.start().await;

        let state = controller.snapshot();
        assert!(state.authenticated);
        assert_eq!(state.role, Role::Coordinator);
    }

    #[tokio::test]
    async fn test_probe_failure_stays_unauthenticated() {
        let backend = MemoryBackend::new();
        backend.fail_on(FailOn::GetSession);

        let controller = controller(&backend);
        controller.start().await;

        let state = controller.snapshot();
        assert!(!state.authenticated);
        assert!(state.probed);
    }

    #[tokio::test]
    async fn test_login_sets_role_from_metadata() {
        let backend = MemoryBackend::new();
        let email: String = SafeEmail().fake();
        backend.seed_user(&email, "secret", None);

        let controller = controller(&backend);
        controller.start().await;
        assert_ok!(controller.login(&email, "secret").await);

        let state = controller.snapshot();
        assert!(state.authenticated);
        assert_eq!(state.role, Role::Teacher);
        assert_eq!(state.email(), Some(email.as_str()));
    }

    #[tokio::test]
    async fn test_late_sign_in_does_not_overwrite_refreshed_session() {
        let backend = MemoryBackend::new();
        backend.seed_user("ana@escola.br", "secret", Some("coordinator"));
        let controller = controller(&backend);
        controller.start().await;
        controller.login("ana@escola.br", "secret").await.unwrap();

        let signed_in = controller.snapshot().session.unwrap();
        let mut refreshed = signed_in.clone();
        refreshed.access_token = "refreshed-token".to_string();
        refreshed.expires_at = signed_in.expires_at.map(|at| at + 60);
        backend.push_event(AuthEvent::TokenRefreshed, Some(refreshed));

        controller.apply_signed_in(signed_in);

        let state = controller.snapshot();
        assert!(state.authenticated);
        assert_eq!(
            state.session.map(|s| s.access_token),
            Some("refreshed-token".to_string())
        );
    }

    #[tokio::test]
    async fn test_sign_in_as_another_user_replaces_session() {
        let backend = MemoryBackend::new();
        backend.seed_user("ana@escola.br", "secret", Some("coordinator"));
        backend.seed_user("rui@escola.br", "secret", None);
        let controller = controller(&backend);
        controller.start().await;
        controller.login("ana@escola.br", "secret").await.unwrap();

        controller.shutdown();
        controller.login("rui@escola.br", "secret").await.unwrap();

        let state = controller.snapshot();
        assert_eq!(state.email(), Some("rui@escola.br"));
        assert_eq!(state.role, Role::Teacher);
    }

    #[tokio::test]
    async fn test_wrong_password_keeps_state() {
        let backend = MemoryBackend::new();
        backend.seed_user("ana@escola.br", "secret", Some("coordinator"));

        let controller = controller(&backend);
        controller.start().await;
        let before = controller.snapshot();

        let err = assert_err!(controller.login("ana@escola.br", "nope").await);
        assert_eq!(err.reason(), "Invalid login credentials");
        assert_eq!(controller.snapshot(), before);
    }

    #[tokio::test]
    async fn test_logout_failure_keeps_session() {
        let backend = MemoryBackend::new();
        backend.seed_user("ana@escola.br", "secret", Some("coordinator"));
        let controller = controller(&backend);
        controller.start().await;
        controller.login("ana@escola.br", "secret").await.unwrap();

        backend.fail_on(FailOn::SignOut);
        assert_err!(controller.logout().await);
        assert!(controller.snapshot().authenticated);

        backend.recover(FailOn::SignOut);
        assert_ok!(controller.logout().await);
        let state = controller.snapshot();
        assert!(!state.authenticated);
        assert_eq!(state.role, Role::Teacher);
    }

    #[tokio::test]
    async fn test_backend_pushed_refresh_replaces_session() {
        let backend = MemoryBackend::new();
        backend.seed_user("ana@escola.br", "secret", None);
        let controller = controller(&backend);
        controller.start().await;
        controller.login("ana@escola.br", "secret").await.unwrap();

        let refreshed = backend.refresh_session().await.unwrap();

        let state = controller.snapshot();
        assert_eq!(
            state.session.map(|s| s.access_token),
            Some(refreshed.access_token)
        );
    }

    #[tokio::test]
    async fn test_no_updates_after_unsubscribe() {
        let backend = MemoryBackend::new();
        backend.seed_user("ana@escola.br", "secret", Some("coordinator"));
        let controller = controller(&backend);
        controller.start().await;
        assert_eq!(backend.listener_count(), 1);

        controller.shutdown();
        assert_eq!(backend.listener_count(), 0);
        assert!(!controller.is_subscribed());

        let session = backend.session_for("ana@escola.br");
        backend.push_event(AuthEvent::SignedIn, session);

        assert!(!controller.snapshot().authenticated);
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let backend = MemoryBackend::new();
        {
            let controller = controller(&backend);
            controller.start().await;
            assert_eq!(backend.listener_count(), 1);
        }
        assert_eq!(backend.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_register_stores_name_and_role() {
        let backend = MemoryBackend::new();
        let controller = controller(&backend);

        let outcome = controller
            .register("bia@escola.br", "secret", "Bia Souza", Role::Coordinator)
            .await
            .unwrap();
        let user = outcome.user();
        assert_eq!(user.metadata_str("name"), Some("Bia Souza"));
        assert_eq!(Role::from_metadata(user), Role::Coordinator);

        let err = controller
            .register("bia@escola.br", "other", "Bia", Role::Teacher)
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "User already registered");
    }
}
