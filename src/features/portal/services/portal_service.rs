use chrono::FixedOffset;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::core::config::DisplayConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::views::{LoginView, LoginViewDto};
use crate::features::files::dtos::FileListDto;
use crate::features::files::models::FileRecord;
use crate::features::files::services::{FileService, FileUpload};
use crate::features::files::views::FileListView;
use crate::features::portal::dtos::PortalViewDto;
use crate::features::portal::router::{select_view, View};
use crate::features::session::{Role, SessionController, SessionState};
use crate::modules::backend::{Backend, SignUpOutcome};

#[derive(Clone)]
struct MountedView {
    view: View,
    /// Id of the user the view was mounted for
    owner: Option<String>,
    file_list: Option<Arc<FileListView>>,
}

impl MountedView {
    fn login() -> Self {
        Self {
            view: View::Login,
            owner: None,
            file_list: None,
        }
    }
}

/// The single portal context: session, login form and the mounted dashboard
pub struct Portal {
    session: Arc<SessionController>,
    backend: Arc<dyn Backend>,
    file_service: Arc<FileService>,
    login: LoginView,
    mounted: RwLock<MountedView>,
    offset: FixedOffset,
}

impl Portal {
    pub fn new(
        session: Arc<SessionController>,
        backend: Arc<dyn Backend>,
        file_service: Arc<FileService>,
        display: &DisplayConfig,
    ) -> Self {
        Self {
            session,
            backend,
            file_service,
            login: LoginView::new(),
            mounted: RwLock::new(MountedView::login()),
            offset: display.offset(),
        }
    }

    pub fn session(&self) -> &Arc<SessionController> {
        &self.session
    }

    pub fn file_service(&self) -> &Arc<FileService> {
        &self.file_service
    }

    /// Re-run the router against the current session and mount its view
    ///
    /// A dashboard fetches its file list once when it is mounted. Switching views,
    /// or users, discards the previous list.
    async fn mounted(&self) -> MountedView {
        self.mount_for(&self.session.snapshot()).await
    }

    async fn mount_for(&self, state: &SessionState) -> MountedView {
        let view = select_view(state.authenticated, state.role);
        let owner = state.session.as_ref().map(|s| s.user.id.clone());

        {
            let current = self.mounted.read().await;
            if current.view == view && current.owner == owner {
                return current.clone();
            }
        }

        let file_list = match view.file_list_variant() {
            Some(variant) => {
                let list = Arc::new(FileListView::new(variant));
                list.fetch(self.backend.as_ref()).await;
                Some(list)
            }
            None => None,
        };

        let mut current = self.mounted.write().await;
        if current.view != view || current.owner != owner {
            info!("Mounting {:?} view", view);
            *current = MountedView {
                view,
                owner,
                file_list,
            };
        }
        current.clone()
    }

    /// Mounted file list, or the error matching the current view
    async fn file_list(&self) -> Result<Arc<FileListView>> {
        self.mounted()
            .await
            .file_list
            .ok_or_else(|| AppError::Unauthorized("Sign in to see files".to_string()))
    }

    /// Mounted read-write list; teachers get `Forbidden`
    async fn writable_file_list(&self) -> Result<Arc<FileListView>> {
        let mounted = self.mounted().await;
        match (mounted.view, mounted.file_list) {
            (View::CoordinatorDashboard, Some(list)) => Ok(list),
            (View::Login, _) => Err(AppError::Unauthorized(
                "Sign in to manage files".to_string(),
            )),
            _ => Err(AppError::Forbidden(
                "Coordinator access required".to_string(),
            )),
        }
    }

    /// View and session fields come from one snapshot
    pub async fn render(&self) -> PortalViewDto {
        let state = self.session.snapshot();
        let mounted = self.mount_for(&state).await;

        PortalViewDto {
            view: mounted.view,
            authenticated: state.authenticated,
            role: state.authenticated.then_some(state.role),
            email: state.email().map(String::from),
            login: (mounted.view == View::Login).then(|| self.login.render()),
            files: mounted.file_list.map(|list| list.render(self.offset)),
        }
    }

    /// Sign in; a failure stays on the login form as an inline error
    pub async fn login(&self, email: &str, password: &str) -> Result<PortalViewDto> {
        self.login.begin_submit();
        if let Err(e) = self.session.login(email, password).await {
            warn!("Sign-in failed for {}: {}", email, e);
            self.login.fail(e.reason());
            return Err(AppError::auth(e));
        }

        info!("User signed in: {}", email);
        self.login.reset();
        Ok(self.render().await)
    }

    /// Create an account; on success the form returns to sign-in with a notice
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: Role,
    ) -> Result<SignUpOutcome> {
        self.login.begin_submit();
        match self.session.register(email, password, name, role).await {
            Ok(outcome) => {
                info!("User registered: {} as {}", email, role.as_str());
                self.login.registered();
                Ok(outcome)
            }
            Err(e) => {
                warn!("Registration failed for {}: {}", email, e);
                self.login.fail(e.reason());
                Err(AppError::auth(e))
            }
        }
    }

    pub async fn logout(&self) -> Result<PortalViewDto> {
        self.session.logout().await.map_err(|e| {
            warn!("Sign-out failed: {}", e);
            AppError::auth(e)
        })?;

        info!("User signed out");
        Ok(self.render().await)
    }

    pub fn toggle_mode(&self) -> LoginViewDto {
        self.login.toggle_mode();
        self.login.render()
    }

    /// Re-fetch the mounted list
    pub async fn refresh_files(&self) -> Result<FileListDto> {
        let list = self.file_list().await?;
        list.fetch(self.backend.as_ref()).await;
        Ok(list.render(self.offset))
    }

    /// Upload through the mounted read-write list; returns record, key and list
    pub async fn upload(&self, upload: FileUpload) -> Result<(FileRecord, String, FileListDto)> {
        let list = self.writable_file_list().await?;
        let (record, key) = self.file_service.upload(&list, upload).await?;
        Ok((record, key, list.render(self.offset)))
    }

    pub async fn delete(&self, id: &str) -> Result<FileListDto> {
        let list = self.writable_file_list().await?;
        self.file_service.delete(&list, id).await?;
        Ok(list.render(self.offset))
    }
}
