use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::files::dtos::FileListVariant;
use crate::features::session::Role;

/// Top-level view shown to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Login,
    /// Read-only file list for teachers
    Dashboard,
    /// Read-write file list for coordinators
    CoordinatorDashboard,
}

impl View {
    pub fn file_list_variant(&self) -> Option<FileListVariant> {
        match self {
            View::Login => None,
            View::Dashboard => Some(FileListVariant::ReadOnly),
            View::CoordinatorDashboard => Some(FileListVariant::ReadWrite),
        }
    }
}

/// Pick the view for the current session; holds no state of its own
pub fn select_view(authenticated: bool, role: Role) -> View {
    match (authenticated, role) {
        (false, _) => View::Login,
        (true, Role::Coordinator) => View::CoordinatorDashboard,
        (true, Role::Teacher) => View::Dashboard,
    }
}
