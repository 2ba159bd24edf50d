use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::modules::backend::{AuthBackend, Session};

/// Longest sleep between checks, so a new session is picked up promptly
const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Back-off after a failed refresh
const RETRY_DELAY: Duration = Duration::from_secs(10);

/// Minimum gap between two refreshes, even when the margin exceeds the lifetime
const MIN_REFRESH_GAP: Duration = Duration::from_secs(5);

/// Keep the backend session alive by refreshing it `margin` before expiry
///
/// The refreshed session reaches the controller as a `TokenRefreshed` event.
pub fn spawn_auto_refresh(auth: Arc<dyn AuthBackend>, margin: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(
            "Session auto-refresh started (margin {}s)",
            margin.as_secs()
        );

        loop {
            let session = match auth.get_session().await {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!("Auto-refresh could not read the session: {}", e);
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }
            };

            let wait = session
                .as_ref()
                .and_then(|s| refresh_due_in(s, margin, Utc::now().timestamp()));

            match wait {
                Some(wait) if wait.is_zero() => match auth.refresh_session().await {
                    Ok(session) => {
                        tracing::debug!("Session refreshed, expires at {:?}", session.expires_at);
                        tokio::time::sleep(MIN_REFRESH_GAP).await;
                    }
                    Err(e) => {
                        tracing::warn!("Session refresh failed: {}", e);
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                },
                Some(wait) => tokio::time::sleep(wait.min(POLL_INTERVAL)).await,
                None => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }
    })
}

/// Time left before the session should be refreshed; `None` when it never expires
fn refresh_due_in(session: &Session, margin: Duration, now: i64) -> Option<Duration> {
    let expires_at = session.expires_at?;
    let refresh_at = expires_at - margin.as_secs() as i64;
    Some(Duration::from_secs(refresh_at.saturating_sub(now).max(0) as u64))
}
