//! REST client for a Supabase project
//!
//! Auth goes through GoTrue (`/auth/v1`), the metadata table through PostgREST
//! (`/rest/v1`) and objects through the Storage API (`/storage/v1`). The client holds
//! the current session itself and pushes every change to registered listeners.

mod auth;
mod storage;
mod table;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{AuthEvent, BackendError, ListenerRegistry, Session};
use crate::core::config::SupabaseConfig;

/// Client for the auth, table and storage endpoints of one project
pub struct SupabaseClient {
    config: SupabaseConfig,
    http_client: reqwest::Client,
    session: RwLock<Option<Session>>,
    listeners: Arc<ListenerRegistry>,
}

/// Error payloads differ between GoTrue, PostgREST and Storage
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| BackendError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        let session = config
            .session_file
            .as_deref()
            .and_then(Self::load_session);

        tracing::info!(
            "Supabase client initialized for {} (table: {}, bucket: {}, restored session: {})",
            config.url,
            config.files_table,
            config.files_bucket,
            session.is_some()
        );

        Ok(Self {
            config,
            http_client,
            session: RwLock::new(session),
            listeners: ListenerRegistry::new(),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.url, path)
    }

    fn rest_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.url, self.config.files_table)
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.url,
            self.config.files_bucket,
            encode_key(key)
        )
    }

    /// `apikey` plus the bearer of the current session, or the anon key without one
    async fn headers(&self) -> HeaderMap {
        let token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.config.anon_key.clone());

        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.config.anon_key) {
            headers.insert("apikey", value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    /// Store the new session, persist it and notify listeners
    async fn set_session(&self, session: Option<Session>, event: AuthEvent) {
        {
            let mut current = self.session.write().await;
            *current = session.clone();
        }

        if let Some(path) = self.config.session_file.as_deref() {
            Self::persist_session(path, session.as_ref()).await;
        }

        self.listeners.emit(event, session.as_ref());
    }

    async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    fn load_session(path: &Path) -> Option<Session> {
        let raw = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("Ignoring unreadable session file {}: {}", path.display(), e);
                None
            }
        }
    }

    async fn persist_session(path: &Path, session: Option<&Session>) {
        let result = match session {
            Some(session) => match serde_json::to_vec(session) {
                Ok(bytes) => tokio::fs::write(path, bytes).await,
                Err(e) => {
                    tracing::warn!("Failed to serialize session: {}", e);
                    return;
                }
            },
            None => match tokio::fs::remove_file(path).await {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };

        if let Err(e) = result {
            tracing::warn!("Failed to update session file {}: {}", path.display(), e);
        }
    }
}

/// Turn a non-success response into `BackendError::Rejected`
async fn rejection(response: reqwest::Response) -> BackendError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    BackendError::Rejected {
        status,
        message: error_message(status, &body),
    }
}

fn error_message(status: u16, body: &str) -> String {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok().and_then(|b| {
        b.msg
            .or(b.message)
            .or(b.error_description)
            .or(b.error.and_then(|e| e.as_str().map(String::from)))
    });

    match parsed {
        Some(message) if !message.is_empty() => message,
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => format!("HTTP {}", status),
    }
}

fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Decode a JSON body, reporting shape mismatches as `BackendError::Decode`
async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, BackendError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
}
