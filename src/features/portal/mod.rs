//! Top-level portal: picks the view for the current session and mounts it

pub mod dtos;
pub mod handlers;
pub mod router;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::Portal;
