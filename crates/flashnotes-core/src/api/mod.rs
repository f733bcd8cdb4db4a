//! REST client module for the study service's UserAuth API.
//!
//! This module provides the `AuthService` trait describing the remote
//! authority, and `AuthClient`, its HTTP implementation.
//!
//! Tokens are opaque bearer strings. The login endpoint returns only a
//! token; the holder's identity comes from a separate lookup.

pub mod client;
pub mod error;
pub mod service;
pub mod types;

pub use client::{AuthClient, DEFAULT_API_BASE_URL};
pub use error::ApiError;
pub use service::AuthService;
pub use types::{AuthenticatedUser, LoginResponse, RegisterResponse, UsernameEntry};
