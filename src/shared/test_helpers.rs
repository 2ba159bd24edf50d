use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::core::config::{DisplayConfig, SupabaseConfig, UploadConfig};
use crate::features::files::models::{FileRecord, NewFileRecord};
use crate::features::files::services::FileService;
use crate::features::portal::services::Portal;
use crate::features::session::SessionController;
use crate::modules::backend::{
    AuthBackend, AuthEvent, AuthListener, AuthUser, BackendError, FileTable, ListenerRegistry,
    ObjectStorage, Session, SignUpOutcome, Subscription,
};

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn spawn_stub_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn supabase_config(url: &str) -> SupabaseConfig {
    SupabaseConfig::from_values(Some(url.to_string()), Some("anon-key".to_string())).unwrap()
}

/// GoTrue-shaped session payload
pub fn stub_session_json(role: &str, access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": format!("refresh-{}", access_token),
        "user": {
            "id": "u1",
            "email": "ana@escola.br",
            "user_metadata": { "name": "Ana", "role": role }
        }
    })
}

/// Started portal over an in-memory backend, dates rendered at UTC-3
pub async fn test_portal(backend: &Arc<MemoryBackend>, upload: UploadConfig) -> Arc<Portal> {
    let auth: Arc<dyn AuthBackend> = backend.clone();
    let session = Arc::new(SessionController::new(auth));
    session.start().await;
    let file_service = Arc::new(FileService::new(backend.clone(), upload));
    Arc::new(Portal::new(
        session,
        backend.clone(),
        file_service,
        &DisplayConfig {
            utc_offset_minutes: -180,
        },
    ))
}

/// Backend operation that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailOn {
    GetSession,
    SignIn,
    SignUp,
    SignOut,
    GetUser,
    Select,
    Insert,
    Delete,
    Upload,
    Remove,
}

struct StoredUser {
    password: String,
    user: AuthUser,
}

/// In-memory stand-in for the managed backend
pub struct MemoryBackend {
    listeners: Arc<ListenerRegistry>,
    session: Mutex<Option<Session>>,
    users: Mutex<HashMap<String, StoredUser>>,
    files: Mutex<Vec<FileRecord>>,
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    failures: Mutex<HashSet<FailOn>>,
    calls: Mutex<Vec<&'static str>>,
    next_id: AtomicU64,
    tick: AtomicI64,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            listeners: ListenerRegistry::new(),
            session: Mutex::new(None),
            users: Mutex::new(HashMap::new()),
            files: Mutex::new(Vec::new()),
            objects: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            tick: AtomicI64::new(0),
        })
    }

    pub fn fail_on(&self, op: FailOn) {
        self.failures.lock().unwrap().insert(op);
    }

    pub fn recover(&self, op: FailOn) {
        self.failures.lock().unwrap().remove(&op);
    }

    /// Register a confirmed user
    pub fn seed_user(&self, email: &str, password: &str, role: Option<&str>) -> AuthUser {
        let mut metadata = Map::new();
        if let Some(role) = role {
            metadata.insert("role".to_string(), json!(role));
        }
        let user = AuthUser {
            id: format!("user-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            email: Some(email.to_string()),
            user_metadata: metadata,
        };
        self.users.lock().unwrap().insert(
            email.to_string(),
            StoredUser {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        user
    }

    /// Insert a row directly, bypassing storage
    pub fn seed_file(&self, name: &str, size: u64) -> FileRecord {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let record = FileRecord {
            id,
            name: name.to_string(),
            content_type: "application/pdf".to_string(),
            size,
            url: self.public_url(name),
            user_id: Some("seed".to_string()),
            created_at: self.next_timestamp(),
            updated_at: None,
        };
        self.files.lock().unwrap().push(record.clone());
        record
    }

    /// Push a session change as if the backend originated it
    pub fn push_event(&self, event: AuthEvent, session: Option<Session>) {
        *self.session.lock().unwrap() = session.clone();
        self.listeners.emit(event, session.as_ref());
    }

    pub fn session_for(&self, email: &str) -> Option<Session> {
        let users = self.users.lock().unwrap();
        users.get(email).map(|stored| self.issue_session(&stored.user))
    }

    pub fn object_keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn rows(&self) -> Vec<FileRecord> {
        self.files.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn check(&self, op: FailOn, call: &'static str) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push(call);
        if self.failures.lock().unwrap().contains(&op) {
            return Err(BackendError::Rejected {
                status: 500,
                message: format!("{} failed", call),
            });
        }
        Ok(())
    }

    fn next_timestamp(&self) -> DateTime<Utc> {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        base + Duration::minutes(self.tick.fetch_add(1, Ordering::SeqCst))
    }

    fn issue_session(&self, user: &AuthUser) -> Session {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        Session {
            access_token: format!("token-{}", n),
            token_type: "bearer".to_string(),
            expires_in: 3600,
            expires_at: Some(Utc::now().timestamp() + 3600),
            refresh_token: format!("refresh-{}", n),
            user: user.clone(),
        }
    }

    fn set_session(&self, session: Option<Session>, event: AuthEvent) {
        *self.session.lock().unwrap() = session.clone();
        self.listeners.emit(event, session.as_ref());
    }
}

#[async_trait]
impl AuthBackend for MemoryBackend {
    async fn get_session(&self) -> Result<Option<Session>, BackendError> {
        self.check(FailOn::GetSession, "get_session")?;
        Ok(self.session.lock().unwrap().clone())
    }

    fn on_auth_state_change(&self, listener: AuthListener) -> Subscription {
        let current = self.session.lock().unwrap().clone();
        listener(AuthEvent::InitialSession, current.as_ref());
        self.listeners.subscribe(listener)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        self.check(FailOn::SignIn, "sign_in")?;
        let session = {
            let users = self.users.lock().unwrap();
            match users.get(email) {
                Some(stored) if stored.password == password => self.issue_session(&stored.user),
                _ => {
                    return Err(BackendError::Rejected {
                        status: 400,
                        message: "Invalid login credentials".to_string(),
                    })
                }
            }
        };
        self.set_session(Some(session.clone()), AuthEvent::SignedIn);
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<SignUpOutcome, BackendError> {
        self.check(FailOn::SignUp, "sign_up")?;
        if self.users.lock().unwrap().contains_key(email) {
            return Err(BackendError::Rejected {
                status: 422,
                message: "User already registered".to_string(),
            });
        }

        let user = AuthUser {
            id: format!("user-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            email: Some(email.to_string()),
            user_metadata: metadata.as_object().cloned().unwrap_or_default(),
        };
        self.users.lock().unwrap().insert(
            email.to_string(),
            StoredUser {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        Ok(SignUpOutcome::PendingConfirmation(user))
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.check(FailOn::SignOut, "sign_out")?;
        self.set_session(None, AuthEvent::SignedOut);
        Ok(())
    }

    async fn get_user(&self) -> Result<AuthUser, BackendError> {
        self.check(FailOn::GetUser, "get_user")?;
        self.session
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.user.clone())
            .ok_or(BackendError::NoSession)
    }

    async fn refresh_session(&self) -> Result<Session, BackendError> {
        let user = self
            .session
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.user.clone())
            .ok_or(BackendError::NoSession)?;
        let session = self.issue_session(&user);
        self.set_session(Some(session.clone()), AuthEvent::TokenRefreshed);
        Ok(session)
    }
}

#[async_trait]
impl FileTable for MemoryBackend {
    async fn select_files(&self) -> Result<Vec<FileRecord>, BackendError> {
        self.check(FailOn::Select, "select")?;
        let mut rows = self.files.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert_file(&self, record: NewFileRecord) -> Result<FileRecord, BackendError> {
        self.check(FailOn::Insert, "insert")?;
        let row = FileRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst).to_string(),
            name: record.name,
            content_type: record.content_type,
            size: record.size,
            url: record.url,
            user_id: Some(record.user_id),
            created_at: self.next_timestamp(),
            updated_at: None,
        };
        self.files.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn delete_file(&self, id: &str) -> Result<(), BackendError> {
        self.check(FailOn::Delete, "delete")?;
        self.files.lock().unwrap().retain(|row| row.id != id);
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for MemoryBackend {
    async fn upload_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        self.check(FailOn::Upload, "upload")?;
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(key) {
            return Err(BackendError::Rejected {
                status: 409,
                message: "The resource already exists".to_string(),
            });
        }
        objects.insert(key.to_string(), (data, content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://memory.test/storage/v1/object/public/files/{}", key)
    }

    async fn remove_object(&self, key: &str) -> Result<(), BackendError> {
        self.check(FailOn::Remove, "remove")?;
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}
