use async_trait::async_trait;

use super::types::{AuthenticatedUser, LoginResponse, RegisterResponse, UsernameEntry};
use super::ApiError;

/// The remote authority the session manager talks to.
///
/// `AuthClient` is the HTTP implementation; tests substitute scripted fakes.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account. The response carries both identity and token.
    async fn register(&self, username: &str, password: &str)
        -> Result<RegisterResponse, ApiError>;

    /// Exchange credentials for a bearer token.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError>;

    /// Invalidate a token server-side.
    async fn logout(&self, token: &str) -> Result<(), ApiError>;

    /// Resolve the user that holds `token`.
    async fn get_authenticated_user(&self, token: &str) -> Result<AuthenticatedUser, ApiError>;

    /// Look up display names for a set of user ids.
    async fn get_usernames(&self, user_ids: &[String]) -> Result<Vec<UsernameEntry>, ApiError>;
}
