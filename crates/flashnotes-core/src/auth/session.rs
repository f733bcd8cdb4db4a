use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::AuthService;

use super::store::{SessionStore, AUTH_TOKEN_KEY, SESSION_KEYS, USERNAME_KEY, USER_ID_KEY};

const CREDENTIALS_REQUIRED: &str = "Username and password required";
const REGISTER_FAILED: &str = "Failed to register user";
const LOGIN_FAILED: &str = "Failed to login";
const AUTHENTICATED_USER_FAILED: &str = "Failed to get authenticated user";
const USERNAMES_FAILED: &str = "Failed to get usernames";

/// Where the session sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    LoggedOut,
    /// Restored from storage, not yet confirmed by the server.
    Pending,
    LoggedIn,
}

/// The in-memory session record.
///
/// `token` and `user_id` are always set or cleared together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: Option<String>,
    pub token: Option<String>,
    pub username: Option<String>,
}

impl SessionData {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user_id.is_some()
    }
}

/// Owns the authentication state and keeps it in sync with a `SessionStore`.
///
/// Failures never surface as `Err`: each operation reports success as a
/// `bool` and leaves a human-readable message in [`SessionManager::error`].
pub struct SessionManager<A, S> {
    api: A,
    store: S,
    data: SessionData,
    pending: bool,
    error: Option<String>,
    authenticated_tx: watch::Sender<bool>,
}

impl<A: AuthService, S: SessionStore> SessionManager<A, S> {
    /// Create an empty, logged-out session. Call [`init`](Self::init) to
    /// restore a stored one.
    pub fn new(api: A, store: S) -> Self {
        let (authenticated_tx, _) = watch::channel(false);
        Self {
            api,
            store,
            data: SessionData::default(),
            pending: false,
            error: None,
            authenticated_tx,
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.data.is_authenticated()
    }

    pub fn status(&self) -> SessionStatus {
        if !self.data.is_authenticated() {
            SessionStatus::LoggedOut
        } else if self.pending {
            SessionStatus::Pending
        } else {
            SessionStatus::LoggedIn
        }
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    pub fn user_id(&self) -> Option<&str> {
        self.data.user_id.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.data.token.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.data.username.as_deref()
    }

    /// Message from the most recent failed operation
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Watch the `is_authenticated` flag
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authenticated_tx.subscribe()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Restore a stored session and revalidate it. Does nothing when no
    /// token and user id are stored.
    pub async fn init(&mut self) {
        let token = self.read_key(AUTH_TOKEN_KEY);
        let user_id = self.read_key(USER_ID_KEY);
        let username = self.read_key(USERNAME_KEY);

        let (Some(token), Some(user_id)) = (token, user_id) else {
            debug!("No stored session");
            return;
        };

        debug!(user_id = %user_id, "Stored session found, verifying");
        self.data = SessionData {
            user_id: Some(user_id),
            token: Some(token),
            username,
        };
        self.pending = true;
        self.publish();

        self.verify_token().await;
    }

    /// Confirm the held token with the server. A rejected token tears the
    /// session down. Returns whether the session is valid afterwards.
    pub async fn verify_token(&mut self) -> bool {
        let Some(token) = self.data.token.clone() else {
            return false;
        };
        self.error = None;

        match self.api.get_authenticated_user(&token).await {
            Ok(authenticated) if !authenticated.user.is_empty() => {
                self.write_key(USER_ID_KEY, &authenticated.user);
                self.data.user_id = Some(authenticated.user);
                self.pending = false;
                self.publish();
                debug!("Token verified");
                true
            }
            Ok(_) => {
                warn!("Token verification returned no user");
                self.error = Some(AUTHENTICATED_USER_FAILED.to_string());
                self.clear_auth();
                false
            }
            Err(e) => {
                warn!(error = %e, "Token verification failed");
                self.error = Some(e.user_message(AUTHENTICATED_USER_FAILED));
                self.clear_auth();
                false
            }
        }
    }

    pub async fn register(&mut self, username: &str, password: &str) -> bool {
        if !self.check_credentials(username, password) {
            return false;
        }

        match self.api.register(username, password).await {
            Ok(response) => {
                self.establish(response.user, response.token, username);
                info!(username = %username, "Registration successful");
                true
            }
            Err(e) => {
                warn!(error = %e, "Registration failed");
                self.error = Some(e.user_message(REGISTER_FAILED));
                false
            }
        }
    }

    /// Two round trips: credentials for a token, then the token for the
    /// user id. Nothing is kept unless both succeed.
    pub async fn login(&mut self, username: &str, password: &str) -> bool {
        if !self.check_credentials(username, password) {
            return false;
        }

        let token = match self.api.login(username, password).await {
            Ok(response) => response.token,
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.error = Some(e.user_message(LOGIN_FAILED));
                return false;
            }
        };

        let user_id = match self.api.get_authenticated_user(&token).await {
            Ok(authenticated) if !authenticated.user.is_empty() => authenticated.user,
            Ok(_) => {
                warn!("Login token resolved to no user");
                self.error = Some(AUTHENTICATED_USER_FAILED.to_string());
                return false;
            }
            Err(e) => {
                warn!(error = %e, "Could not resolve user for login token");
                self.error = Some(e.user_message(AUTHENTICATED_USER_FAILED));
                return false;
            }
        };

        self.establish(user_id, token, username);
        info!(username = %username, "Login successful");
        true
    }

    /// Invalidate the token server-side if possible, then clear locally no
    /// matter what the server said.
    pub async fn logout(&mut self) {
        if let Some(token) = self.data.token.clone() {
            if let Err(e) = self.api.logout(&token).await {
                warn!(error = %e, "Remote logout failed, clearing local session anyway");
            }
        }
        self.error = None;
        self.clear_auth();
        info!("Logged out");
    }

    /// Drop all session state, in memory and in the store.
    pub fn clear_auth(&mut self) {
        self.data = SessionData::default();
        self.pending = false;
        for key in SESSION_KEYS {
            if let Err(e) = self.store.remove(key) {
                warn!(key = key, error = %e, "Failed to remove session key");
            }
        }
        self.publish();
    }

    /// Resolve display names for user ids. Returns `None` on failure and
    /// records the error message.
    pub async fn lookup_usernames(&mut self, user_ids: &[String]) -> Option<Vec<String>> {
        if user_ids.is_empty() {
            return Some(Vec::new());
        }
        match self.api.get_usernames(user_ids).await {
            Ok(entries) => Some(entries.into_iter().map(|e| e.username).collect()),
            Err(e) => {
                warn!(error = %e, count = user_ids.len(), "Username lookup failed");
                self.error = Some(e.user_message(USERNAMES_FAILED));
                None
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn check_credentials(&mut self, username: &str, password: &str) -> bool {
        if username.is_empty() || password.is_empty() {
            self.error = Some(CREDENTIALS_REQUIRED.to_string());
            return false;
        }
        self.error = None;
        true
    }

    fn establish(&mut self, user_id: String, token: String, username: &str) {
        self.write_key(AUTH_TOKEN_KEY, &token);
        self.write_key(USER_ID_KEY, &user_id);
        self.write_key(USERNAME_KEY, username);

        self.data = SessionData {
            user_id: Some(user_id),
            token: Some(token),
            username: Some(username.to_string()),
        };
        self.pending = false;
        self.publish();
    }

    fn read_key(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = key, error = %e, "Failed to read session key");
                None
            }
        }
    }

    fn write_key(&mut self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            warn!(key = key, error = %e, "Failed to persist session key");
        }
    }

    fn publish(&self) {
        let authenticated = self.data.is_authenticated();
        self.authenticated_tx.send_if_modified(|current| {
            if *current == authenticated {
                false
            } else {
                *current = authenticated;
                true
            }
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
