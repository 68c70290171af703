//! Auth and rate limiting test doubles.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::auth_provider::{AuthProvider, AuthSession, SessionUser, SignUpInput},
    infra::RateLimiter,
};

/// Auth provider whose every call fails, as if the provider were down.
pub struct FailingAuthProvider;

#[async_trait]
impl AuthProvider for FailingAuthProvider {
    async fn sign_up(&self, _input: &SignUpInput) -> AppResult<AuthSession> {
        Err(AppError::Provider("auth provider down".into()))
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> AppResult<AuthSession> {
        Err(AppError::Provider("auth provider down".into()))
    }

    async fn sign_out(&self, _access_token: &str) -> AppResult<()> {
        Err(AppError::Provider("auth provider down".into()))
    }

    async fn reset_password(&self, _email: &str, _redirect_to: &str) -> AppResult<()> {
        Err(AppError::Provider("auth provider down".into()))
    }

    async fn get_user(&self, _access_token: &str) -> AppResult<Option<SessionUser>> {
        Err(AppError::Provider("auth provider down".into()))
    }
}

/// Counting rate limiter without expiry.
pub struct InMemoryRateLimiter {
    max_per_ip: u64,
    pub counts: Mutex<HashMap<String, u64>>,
}

impl InMemoryRateLimiter {
    pub fn permissive() -> Self {
        Self::with_limit(u64::MAX)
    }

    pub fn with_limit(max_per_ip: u64) -> Self {
        Self {
            max_per_ip,
            counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn count(&self, ip: &str) -> u64 {
        self.counts.lock().unwrap().get(ip).copied().unwrap_or(0)
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, ip: &str) -> AppResult<()> {
        let mut counts = self.counts.lock().unwrap();
        let count = counts.entry(ip.to_string()).or_insert(0);
        *count += 1;
        if *count > self.max_per_ip {
            return Err(AppError::RateLimited);
        }
        Ok(())
    }
}
