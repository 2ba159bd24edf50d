//! Session tracking for the single portal context
//!
//! The controller mirrors the backend session locally and derives the user's role
//! from its metadata. Backend-pushed changes are the source of truth; login and
//! logout additionally update the local state as a fast path.

pub mod models;
pub mod services;

pub use models::{Role, SessionState};
pub use services::{spawn_auto_refresh, SessionController};
