//! Supabase (GoTrue) auth provider over its REST API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::auth_provider::{AuthProvider, AuthSession, SessionUser, SignUpInput},
};

pub struct SupabaseAuthProvider {
    client: Client,
    base_url: String,
    anon_key: SecretString,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: GoTrueMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct GoTrueMetadata {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoTrueSession {
    access_token: String,
    user: GoTrueUser,
}

/// Sign-up returns a session when auto-confirm is on, otherwise the bare user.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(GoTrueSession),
    User(GoTrueUser),
}

#[derive(Debug, Default, Deserialize)]
struct GoTrueError {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl GoTrueError {
    fn into_message(self) -> String {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
            .unwrap_or_else(|| "Authentication failed".to_string())
    }
}

impl From<GoTrueUser> for SessionUser {
    fn from(user: GoTrueUser) -> Self {
        SessionUser {
            id: user.id,
            email: user.email.unwrap_or_default(),
            name: user.user_metadata.name,
        }
    }
}

impl SupabaseAuthProvider {
    pub fn new(client: Client, base_url: Url, anon_key: SecretString) -> Self {
        Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            anon_key,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.endpoint(path))
            .header("apikey", self.anon_key.expose_secret())
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> AppResult<reqwest::Response> {
        builder
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Auth provider request failed: {}", e)))
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> AppResult<T> {
        response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Failed to parse auth provider response: {}", e)))
    }

    /// Client errors become `InvalidInput` with the provider's message.
    async fn error_from(response: reqwest::Response) -> AppError {
        let status = response.status();
        let body: GoTrueError = response.json().await.unwrap_or_default();
        let message = body.into_message();
        if status.is_client_error() {
            tracing::debug!(status = %status, message = %message, "Auth provider rejected request");
            AppError::InvalidInput(message)
        } else {
            tracing::error!(status = %status, message = %message, "Auth provider error");
            AppError::Provider(message)
        }
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuthProvider {
    async fn sign_up(&self, input: &SignUpInput) -> AppResult<AuthSession> {
        let response = self
            .send(self.request(reqwest::Method::POST, "/signup").json(&json!({
                "email": input.email,
                "password": input.password,
                "data": { "name": input.name },
            })))
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        Ok(match Self::read_json::<SignUpResponse>(response).await? {
            SignUpResponse::Session(session) => AuthSession {
                access_token: Some(session.access_token),
                user: session.user.into(),
            },
            SignUpResponse::User(user) => AuthSession {
                access_token: None,
                user: user.into(),
            },
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<AuthSession> {
        let response = self
            .send(
                self.request(reqwest::Method::POST, "/token")
                    .query(&[("grant_type", "password")])
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;
        match response.status() {
            s if s.is_success() => {}
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                return Err(AppError::Unauthorized);
            }
            _ => return Err(Self::error_from(response).await),
        }

        let session: GoTrueSession = Self::read_json(response).await?;
        Ok(AuthSession {
            access_token: Some(session.access_token),
            user: session.user.into(),
        })
    }

    async fn sign_out(&self, access_token: &str) -> AppResult<()> {
        let response = self
            .send(self.request(reqwest::Method::POST, "/logout").bearer_auth(access_token))
            .await?;
        // An already-invalid token is as good as signed out.
        if response.status().is_success() || response.status() == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        Err(Self::error_from(response).await)
    }

    async fn reset_password(&self, email: &str, redirect_to: &str) -> AppResult<()> {
        let response = self
            .send(
                self.request(reqwest::Method::POST, "/recover")
                    .query(&[("redirect_to", redirect_to)])
                    .json(&json!({ "email": email })),
            )
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> AppResult<Option<SessionUser>> {
        let response = self
            .send(self.request(reqwest::Method::GET, "/user").bearer_auth(access_token))
            .await?;
        match response.status() {
            s if s.is_success() => {
                let user: GoTrueUser = Self::read_json(response).await?;
                Ok(Some(user.into()))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            _ => Err(Self::error_from(response).await),
        }
    }
}
