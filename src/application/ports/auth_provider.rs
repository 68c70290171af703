use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app_error::AppResult;

// ============================================================================
// Port Types
// ============================================================================

/// The authenticated caller as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Result of a sign-up or sign-in.
///
/// `access_token` is absent when the provider requires email confirmation
/// before issuing a session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: Option<String>,
    pub user: SessionUser,
}

#[derive(Debug, Clone)]
pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub name: String,
}

// ============================================================================
// Port Trait
// ============================================================================

/// Session and identity operations of an external auth provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, input: &SignUpInput) -> AppResult<AuthSession>;

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<AuthSession>;

    async fn sign_out(&self, access_token: &str) -> AppResult<()>;

    /// Send a password reset email that links back to `redirect_to`.
    async fn reset_password(&self, email: &str, redirect_to: &str) -> AppResult<()>;

    /// Resolve a session token. `Ok(None)` means the token is not a valid session.
    async fn get_user(&self, access_token: &str) -> AppResult<Option<SessionUser>>;
}
