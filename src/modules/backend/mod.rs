//! Backend client for the managed service behind the portal
//!
//! The portal never talks to a database or bucket of its own. Authentication, the
//! `files` table and the `files` bucket all live in the external service, reached
//! through the three traits below. `SupabaseClient` implements them over REST; tests
//! use an in-memory implementation.

mod listeners;
mod session;
pub mod supabase;

use async_trait::async_trait;
use thiserror::Error;

use crate::features::files::models::{FileRecord, NewFileRecord};

pub use listeners::{AuthListener, ListenerRegistry, Subscription};
pub use session::{AuthEvent, AuthUser, Session, SignUpOutcome};
pub use supabase::SupabaseClient;

/// Failure of a single backend call
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    /// The service answered with an error status
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The request never produced a response
    #[error("Request to backend failed: {0}")]
    Transport(String),

    /// The response did not have the expected shape
    #[error("Unexpected backend response: {0}")]
    Decode(String),

    /// The call needs an authenticated session and there is none
    #[error("No active session")]
    NoSession,
}

impl BackendError {
    /// Human-readable reason shown to the user
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

/// Authentication half of the backend
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Currently held session, if any
    async fn get_session(&self) -> Result<Option<Session>, BackendError>;

    /// Register a listener for every session change pushed by the backend
    fn on_auth_state_change(&self, listener: AuthListener) -> Subscription;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError>;

    /// Create a user with arbitrary metadata attached
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> Result<SignUpOutcome, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;

    /// Fresh lookup of the user behind the current session
    async fn get_user(&self) -> Result<AuthUser, BackendError>;

    /// Exchange the refresh token for a new session
    async fn refresh_session(&self) -> Result<Session, BackendError>;
}

/// The `files` metadata table
#[async_trait]
pub trait FileTable: Send + Sync {
    /// All rows, newest `created_at` first
    async fn select_files(&self) -> Result<Vec<FileRecord>, BackendError>;

    async fn insert_file(&self, record: NewFileRecord) -> Result<FileRecord, BackendError>;

    async fn delete_file(&self, id: &str) -> Result<(), BackendError>;
}

/// The `files` object bucket
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError>;

    /// Publicly resolvable URL of the object stored under `key`
    fn public_url(&self, key: &str) -> String;

    async fn remove_object(&self, key: &str) -> Result<(), BackendError>;
}

/// Everything the portal needs from the managed service
pub trait Backend: AuthBackend + FileTable + ObjectStorage {}

impl<T> Backend for T where T: AuthBackend + FileTable + ObjectStorage {}
