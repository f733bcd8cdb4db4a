//! Core library for flashnotes.
//!
//! Talks to the study service's UserAuth API and keeps the signed-in
//! session, persisted between runs and revalidated on startup.

pub mod api;
pub mod auth;
pub mod config;

pub use api::{ApiError, AuthClient, AuthService};
pub use auth::{SessionManager, SessionStatus, SessionStore};
pub use config::{Config, StoreBackend};
