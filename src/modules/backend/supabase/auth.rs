use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use super::{decode, rejection, SupabaseClient};
use crate::modules::backend::{
    AuthBackend, AuthEvent, AuthListener, AuthUser, BackendError, Session, SignUpOutcome,
    Subscription,
};

#[async_trait]
impl AuthBackend for SupabaseClient {
    async fn get_session(&self) -> Result<Option<Session>, BackendError> {
        let Some(session) = self.current_session().await else {
            return Ok(None);
        };

        let expired = session
            .expires_at
            .is_some_and(|at| at <= Utc::now().timestamp());
        if !expired {
            return Ok(Some(session));
        }

        tracing::debug!("Stored session expired, attempting refresh");
        match self.refresh_session().await {
            Ok(session) => Ok(Some(session)),
            Err(BackendError::Rejected { status, message }) => {
                tracing::info!(
                    "Expired session could not be refreshed ({}): {}",
                    status,
                    message
                );
                self.set_session(None, AuthEvent::SignedOut).await;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Registers first, then replays the current session as `InitialSession`
    ///
    /// When a write is in flight the replay is skipped; that writer emits to the
    /// new listener once it releases the lock. The read guard is held during the
    /// replay so it cannot land after a newer emit.
    fn on_auth_state_change(&self, listener: AuthListener) -> Subscription {
        let subscription = self.listeners.subscribe(listener.clone());
        if let Ok(current) = self.session.try_read() {
            listener(AuthEvent::InitialSession, current.as_ref());
        }
        subscription
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        tracing::debug!("Signing in {}", email);

        let response = self
            .http_client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .headers(self.headers().await)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let session = decode::<Session>(response).await?.normalized();
        tracing::info!("Signed in user {}", session.user.id);

        self.set_session(Some(session.clone()), AuthEvent::SignedIn)
            .await;
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<SignUpOutcome, BackendError> {
        tracing::debug!("Signing up {}", email);

        let response = self
            .http_client
            .post(self.auth_url("signup"))
            .headers(self.headers().await)
            .json(&json!({ "email": email, "password": password, "data": metadata }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        // Auto-confirmed projects answer with a session, the rest with the bare user
        let body: Value = decode(response).await?;
        let outcome = if body.get("access_token").is_some() {
            let session: Session =
                serde_json::from_value(body).map_err(|e| BackendError::Decode(e.to_string()))?;
            SignUpOutcome::SignedIn(session.normalized())
        } else {
            let user_value = match body.get("user") {
                Some(user) if user.is_object() => user.clone(),
                _ => body,
            };
            let user: AuthUser = serde_json::from_value(user_value)
                .map_err(|e| BackendError::Decode(e.to_string()))?;
            SignUpOutcome::PendingConfirmation(user)
        };

        tracing::info!("Registered user {}", outcome.user().id);

        if let SignUpOutcome::SignedIn(session) = &outcome {
            self.set_session(Some(session.clone()), AuthEvent::SignedIn)
                .await;
        }
        Ok(outcome)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        if self.current_session().await.is_none() {
            tracing::debug!("Sign out without a session");
            self.set_session(None, AuthEvent::SignedOut).await;
            return Ok(());
        }

        let response = self
            .http_client
            .post(self.auth_url("logout"))
            .headers(self.headers().await)
            .send()
            .await?;

        let status = response.status();
        // An already revoked or unknown token still means signed out
        if !status.is_success() && status.as_u16() != 401 && status.as_u16() != 404 {
            return Err(rejection(response).await);
        }

        tracing::info!("Signed out");
        self.set_session(None, AuthEvent::SignedOut).await;
        Ok(())
    }

    async fn get_user(&self) -> Result<AuthUser, BackendError> {
        if self.current_session().await.is_none() {
            return Err(BackendError::NoSession);
        }

        let response = self
            .http_client
            .get(self.auth_url("user"))
            .headers(self.headers().await)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        decode(response).await
    }

    async fn refresh_session(&self) -> Result<Session, BackendError> {
        let refresh_token = match self.current_session().await {
            Some(session) if !session.refresh_token.is_empty() => session.refresh_token,
            _ => return Err(BackendError::NoSession),
        };

        let response = self
            .http_client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "refresh_token")])
            .headers(self.headers().await)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let session = decode::<Session>(response).await?.normalized();
        tracing::debug!(
            "Session refreshed for user {}, expires at {:?}",
            session.user.id,
            session.expires_at()
        );

        self.set_session(Some(session.clone()), AuthEvent::TokenRefreshed)
            .await;
        Ok(session)
    }
}
