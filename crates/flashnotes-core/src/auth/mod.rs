//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `SessionManager`: login/register/logout and startup revalidation
//! - `SessionStore`: key-value persistence for the session fields, with
//!   `MemoryStore`, `FileStore` and the keychain-backed `KeyringStore`
//!
//! A stored session is only trusted after the server confirms its token.

pub mod credentials;
pub mod session;
pub mod store;

pub use credentials::KeyringStore;
pub use session::{SessionData, SessionManager, SessionStatus};
pub use store::{
    FileStore, MemoryStore, SessionStore, AUTH_TOKEN_KEY, SESSION_KEYS, USERNAME_KEY, USER_ID_KEY,
};
