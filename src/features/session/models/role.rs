use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::modules::backend::{AuthUser, Session};
use crate::shared::constants::{ROLE_COORDINATOR, ROLE_METADATA_KEY, ROLE_TEACHER};

/// Portal role carried in the user metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Read-only access to the shared files
    #[default]
    Teacher,
    /// Read-write access: upload and delete
    Coordinator,
}

impl Role {
    /// Only the exact value `coordinator` grants write access
    pub fn from_metadata(user: &AuthUser) -> Self {
        match user.metadata_str(ROLE_METADATA_KEY) {
            Some(ROLE_COORDINATOR) => Role::Coordinator,
            _ => Role::Teacher,
        }
    }

    pub fn from_session(session: Option<&Session>) -> Self {
        session
            .map(|s| Self::from_metadata(&s.user))
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Teacher => ROLE_TEACHER,
            Role::Coordinator => ROLE_COORDINATOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn user_with(metadata: serde_json::Value) -> AuthUser {
        AuthUser {
            id: "u1".to_string(),
            email: None,
            user_metadata: metadata.as_object().cloned().unwrap_or_else(Map::new),
        }
    }

    #[test]
    fn test_coordinator_role_requires_exact_value() {
        assert_eq!(
            Role::from_metadata(&user_with(json!({ "role": "coordinator" }))),
            Role::Coordinator
        );
        assert_eq!(
            Role::from_metadata(&user_with(json!({ "role": "Coordinator" }))),
            Role::Teacher
        );
        assert_eq!(
            Role::from_metadata(&user_with(json!({ "role": "coordinator " }))),
            Role::Teacher
        );
    }

    #[test]
    fn test_missing_or_unknown_role_is_teacher() {
        assert_eq!(Role::from_metadata(&user_with(json!({}))), Role::Teacher);
        assert_eq!(
            Role::from_metadata(&user_with(json!({ "role": "principal" }))),
            Role::Teacher
        );
        assert_eq!(
            Role::from_metadata(&user_with(json!({ "role": null }))),
            Role::Teacher
        );
        assert_eq!(Role::from_session(None), Role::Teacher);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Role::Coordinator).unwrap(), "coordinator");
        assert_eq!(Role::Teacher.as_str(), "teacher");
    }
}
