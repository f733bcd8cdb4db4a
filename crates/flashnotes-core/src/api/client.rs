//! HTTP client for the study service's UserAuth endpoints.
//!
//! Every endpoint is a JSON `POST`. Query endpoints (the ones prefixed with
//! an underscore) answer with arrays.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::service::AuthService;
use super::types::{
    AuthenticatedUser, CredentialsRequest, LoginResponse, RegisterResponse, TokenRequest,
    UsernameEntry, UsernamesRequest,
};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when neither config nor environment provide one
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

const REGISTER_PATH: &str = "/api/UserAuth/register";
const LOGIN_PATH: &str = "/api/UserAuth/login";
const LOGOUT_PATH: &str = "/api/UserAuth/logout";
const AUTHENTICATED_USER_PATH: &str = "/api/UserAuth/_getAuthenticatedUser";
const USERNAMES_PATH: &str = "/api/UserAuth/_getUsername";

/// API client for the UserAuth service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    /// Create a new client. `timeout` of `None` leaves reqwest's default in place.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST `body` and return the raw response text.
    ///
    /// The backend reports refusals as `{"error": ...}`, sometimes with a 2xx
    /// status, so the body is checked on success too.
    async fn send<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String, ApiError> {
        let url = self.url(path);
        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!(url = %url, status = %status, "Request failed");
            return Err(ApiError::from_status(status, &text));
        }
        if let Some(message) = ApiError::server_message(&text) {
            debug!(url = %url, "Request rejected by server");
            return Err(ApiError::Rejected(message));
        }
        Ok(text)
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let text = self.send(path, body).await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", path, e)))
    }

    /// POST to a query endpoint and take the first row of the result.
    async fn query_first<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &'static str,
        body: &B,
    ) -> Result<T, ApiError> {
        let rows: Vec<T> = self.post(path, body).await?;
        rows.into_iter()
            .next()
            .ok_or(ApiError::EmptyResponse(path))
    }
}

#[async_trait]
impl AuthService for AuthClient {
    async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<RegisterResponse, ApiError> {
        self.post(REGISTER_PATH, &CredentialsRequest { username, password })
            .await
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        self.post(LOGIN_PATH, &CredentialsRequest { username, password })
            .await
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        self.send(LOGOUT_PATH, &TokenRequest { token }).await?;
        Ok(())
    }

    async fn get_authenticated_user(&self, token: &str) -> Result<AuthenticatedUser, ApiError> {
        self.query_first(AUTHENTICATED_USER_PATH, &TokenRequest { token })
            .await
    }

    async fn get_usernames(&self, user_ids: &[String]) -> Result<Vec<UsernameEntry>, ApiError> {
        self.post(USERNAMES_PATH, &UsernamesRequest { users: user_ids })
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
