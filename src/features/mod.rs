pub mod auth;
pub mod files;
pub mod portal;
pub mod session;
