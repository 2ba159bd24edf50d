use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use utoipa::ToSchema;

/// Shown after a successful registration
pub const REGISTERED_NOTICE: &str = "Registration successful. You can now sign in.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoginMode {
    #[default]
    SignIn,
    SignUp,
}

/// Rendered login form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LoginViewDto {
    pub mode: LoginMode,
    #[schema(example = "Sign in to access your files")]
    pub subtitle: String,
    /// Inline error from the last submission
    pub error: Option<String>,
    /// One-off notice, e.g. after registering
    pub notice: Option<String>,
}

#[derive(Debug, Default)]
struct LoginForm {
    mode: LoginMode,
    error: Option<String>,
    notice: Option<String>,
}

/// Form state of the unauthenticated view
#[derive(Debug, Default)]
pub struct LoginView {
    form: RwLock<LoginForm>,
}

impl LoginView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch between sign-in and sign-up
    pub fn toggle_mode(&self) -> LoginMode {
        self.write(|form| {
            form.mode = match form.mode {
                LoginMode::SignIn => LoginMode::SignUp,
                LoginMode::SignUp => LoginMode::SignIn,
            };
            form.mode
        })
    }

    /// Every submission starts with a clean error
    pub fn begin_submit(&self) {
        self.write(|form| {
            form.error = None;
            form.notice = None;
        })
    }

    pub fn fail(&self, reason: String) {
        self.write(|form| form.error = Some(reason))
    }

    /// Registration succeeded: show the notice and go back to sign-in
    pub fn registered(&self) {
        self.write(|form| {
            form.mode = LoginMode::SignIn;
            form.notice = Some(REGISTERED_NOTICE.to_string());
        })
    }

    pub fn reset(&self) {
        self.write(|form| *form = LoginForm::default())
    }

    pub fn render(&self) -> LoginViewDto {
        self.read(|form| LoginViewDto {
            mode: form.mode,
            subtitle: match form.mode {
                LoginMode::SignIn => "Sign in to access your files",
                LoginMode::SignUp => "Create your account",
            }
            .to_string(),
            error: form.error.clone(),
            notice: form.notice.clone(),
        })
    }

    fn read<T>(&self, f: impl FnOnce(&LoginForm) -> T) -> T {
        f(&self.form.read().unwrap_or_else(|e| e.into_inner()))
    }

    fn write<T>(&self, f: impl FnOnce(&mut LoginForm) -> T) -> T {
        f(&mut self.form.write().unwrap_or_else(|e| e.into_inner()))
    }
}
