use super::Role;
use crate::modules::backend::Session;

/// Local mirror of the backend session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub session: Option<Session>,
    pub authenticated: bool,
    pub role: Role,
    /// Set once the startup probe (or any session event) has resolved
    pub probed: bool,
}

impl SessionState {
    pub fn from_session(session: Option<Session>) -> Self {
        Self {
            authenticated: session.is_some(),
            role: Role::from_session(session.as_ref()),
            session,
            probed: true,
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.user.email.as_deref())
    }
}
