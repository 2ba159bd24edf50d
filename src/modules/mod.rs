//! Modules layer - Infrastructure components for external integrations
//!
//! Contains the client for the managed backend (auth, table, object storage).

pub mod backend;
