use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::session::{Role, SessionState};
use crate::shared::constants::NAME_METADATA_KEY;

/// The signed-in user of the portal, as seen by request handlers
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Full name given at sign-up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: Role,
}

impl AuthenticatedUser {
    /// `None` unless the state is authenticated
    pub fn from_state(state: &SessionState) -> Option<Self> {
        if !state.authenticated {
            return None;
        }
        let session = state.session.as_ref()?;
        Some(Self {
            user_id: session.user.id.clone(),
            email: session.user.email.clone(),
            name: session.user.metadata_str(NAME_METADATA_KEY).map(String::from),
            role: state.role,
        })
    }

    pub fn is_coordinator(&self) -> bool {
        self.role == Role::Coordinator
    }
}
