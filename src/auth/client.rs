use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Endpoints;
use crate::error::ApiError;
use crate::http::pipeline::ApiClient;
use crate::session::state::User;
use crate::session::store::SessionStore;

/// Login request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login response: credential, profile, declared lifetime.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
    /// Declared token lifetime in seconds; informational, the token's own
    /// `exp` claim is authoritative
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Registration request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
struct ForgotPasswordRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest<'a> {
    token: &'a str,
    new_password: &'a str,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    user: User,
}

/// Request/response wrapper around the identity provider.
///
/// The one behavioral rule here: a successful login commits to the session
/// store before the caller gets the response back, so anything reacting to
/// the store (monitor, guards) sees the new state no later than UI code does.
pub struct AuthClient {
    api: Arc<ApiClient>,
    store: Arc<SessionStore>,
    endpoints: Endpoints,
}

impl AuthClient {
    pub fn new(api: Arc<ApiClient>, store: Arc<SessionStore>, endpoints: Endpoints) -> Self {
        Self {
            api,
            store,
            endpoints,
        }
    }

    /// Authenticate against the identity provider and establish a session.
    ///
    /// The commit is epoch-guarded: if a logout landed while the request was
    /// in flight, the stale completion is discarded and the store stays
    /// unauthenticated.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let epoch = self.store.epoch();
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self.api.post(&self.endpoints.login, &request).await?;
        let login: LoginResponse = response.json().map_err(ApiError::InvalidBody)?;

        let committed = self
            .store
            .commit_if_current(epoch, login.token.clone(), login.user.clone())
            .await
            .map_err(ApiError::Transport)?;
        if committed {
            info!(user_id = %login.user.id, "login succeeded");
        } else {
            debug!("login completed after a session change, not committed");
        }

        Ok(login)
    }

    /// Create an account. Does not establish a session.
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        let response = self.api.post(&self.endpoints.register, request).await?;
        response.json().map_err(ApiError::InvalidBody)
    }

    /// Request a password-reset email.
    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        self.api
            .post(&self.endpoints.forgot_password, &ForgotPasswordRequest { email })
            .await?;
        Ok(())
    }

    /// Complete a password reset with the emailed token.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ApiError> {
        self.api
            .post(
                &self.endpoints.reset_password,
                &ResetPasswordRequest {
                    token,
                    new_password,
                },
            )
            .await?;
        Ok(())
    }

    /// Refresh the stored profile from the identity provider.
    ///
    /// The state is replaced wholesale (same token, fresh user); a session
    /// change during the round-trip discards the refresh.
    pub async fn refresh_current_user(&self) -> Result<User, ApiError> {
        let epoch = self.store.epoch();
        let state = self.store.get();

        let response = self.api.get(&self.endpoints.current_user).await?;
        let fetched: UserResponse = response.json().map_err(ApiError::InvalidBody)?;

        if let Some(token) = state.token() {
            let _ = self
                .store
                .commit_if_current(epoch, token.to_string(), fetched.user.clone())
                .await
                .map_err(ApiError::Transport)?;
        }

        Ok(fetched.user)
    }
}
