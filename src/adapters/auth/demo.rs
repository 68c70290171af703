//! Local auth provider for development and demos.
//!
//! Any credentials are accepted; sessions are HS256 tokens signed with the
//! configured secret.

use async_trait::async_trait;
use secrecy::SecretString;
use time::Duration;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        jwt,
        ports::auth_provider::{AuthProvider, AuthSession, SessionUser, SignUpInput},
    },
};

pub const DEMO_USER_ID: &str = "mock-user-id";

pub struct DemoAuthProvider {
    jwt_secret: SecretString,
    session_ttl: Duration,
}

impl DemoAuthProvider {
    pub fn new(jwt_secret: SecretString, session_ttl: Duration) -> Self {
        Self {
            jwt_secret,
            session_ttl,
        }
    }

    fn session_for(&self, user: SessionUser) -> AppResult<AuthSession> {
        let token = jwt::issue(&user, &self.jwt_secret, self.session_ttl)?;
        Ok(AuthSession {
            access_token: Some(token),
            user,
        })
    }
}

#[async_trait]
impl AuthProvider for DemoAuthProvider {
    async fn sign_up(&self, input: &SignUpInput) -> AppResult<AuthSession> {
        self.session_for(SessionUser {
            id: DEMO_USER_ID.to_string(),
            email: input.email.clone(),
            name: Some(input.name.clone()),
        })
    }

    async fn sign_in(&self, email: &str, _password: &str) -> AppResult<AuthSession> {
        self.session_for(SessionUser {
            id: DEMO_USER_ID.to_string(),
            email: email.to_string(),
            name: None,
        })
    }

    async fn sign_out(&self, _access_token: &str) -> AppResult<()> {
        Ok(())
    }

    async fn reset_password(&self, email: &str, redirect_to: &str) -> AppResult<()> {
        tracing::info!(email, redirect_to, "Demo auth: password reset requested");
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> AppResult<Option<SessionUser>> {
        match jwt::verify(access_token, &self.jwt_secret) {
            Ok(claims) => Ok(Some(claims.into())),
            Err(AppError::Unauthorized) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
