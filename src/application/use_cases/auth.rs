use std::sync::Arc;

use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        analytics::Analytics,
        notifications::Notifier,
        ports::auth_provider::{AuthProvider, AuthSession, SessionUser, SignUpInput},
        validators::{is_valid_email, is_valid_name, sanitize_input, validate_password},
    },
    props,
};

#[derive(Clone)]
pub struct AuthUseCases {
    provider: Arc<dyn AuthProvider>,
    analytics: Arc<Analytics>,
    app_origin: Url,
    notifier: Option<Arc<Notifier>>,
}

impl AuthUseCases {
    pub fn new(provider: Arc<dyn AuthProvider>, analytics: Arc<Analytics>, app_origin: Url) -> Self {
        Self {
            provider,
            analytics,
            app_origin,
            notifier: None,
        }
    }

    /// Send a welcome email after each sign-up.
    pub fn with_notifier(mut self, notifier: Arc<Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> AppResult<AuthSession> {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AppError::InvalidInput(
                "Please enter a valid email address".into(),
            ));
        }

        let name = sanitize_input(name);
        if !is_valid_name(&name) {
            return Err(AppError::InvalidInput(
                "Name must be at least 2 characters".into(),
            ));
        }

        let validation = validate_password(password);
        if !validation.is_valid {
            return Err(AppError::InvalidInput(validation.errors.join(", ")));
        }

        let session = self
            .provider
            .sign_up(&SignUpInput {
                email,
                password: password.to_string(),
                name: name.clone(),
            })
            .await?;

        tracing::info!(user_id = %session.user.id, "User signed up");
        self.analytics
            .track_user_action("user_signup", props! { "user_id" => session.user.id });
        if let Some(notifier) = &self.notifier {
            notifier.welcome(&session.user.email, Some(&name)).await;
        }
        Ok(session)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<AuthSession> {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AppError::InvalidInput(
                "Please enter a valid email address".into(),
            ));
        }
        if password.is_empty() {
            return Err(AppError::InvalidInput("Password is required".into()));
        }

        let session = self.provider.sign_in(&email, password).await?;

        tracing::info!(user_id = %session.user.id, "User signed in");
        self.analytics
            .track_user_action("user_login", props! { "user_id" => session.user.id });
        Ok(session)
    }

    pub async fn sign_out(&self, access_token: Option<&str>) -> AppResult<()> {
        if let Some(token) = access_token {
            self.provider.sign_out(token).await?;
        }
        self.analytics.track_user_action("user_logout", props! {});
        Ok(())
    }

    pub async fn reset_password(&self, email: &str) -> AppResult<()> {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AppError::InvalidInput(
                "Please enter a valid email address".into(),
            ));
        }
        let redirect_to = format!(
            "{}/auth/reset-password",
            self.app_origin.as_str().trim_end_matches('/')
        );
        self.provider.reset_password(&email, &redirect_to).await
    }

    /// Resolve the caller's session. Lookup failures count as no session.
    pub async fn session_user(&self, access_token: Option<&str>) -> Option<SessionUser> {
        let token = access_token.filter(|t| !t.is_empty())?;
        match self.provider.get_user(token).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed, treating as signed out");
                None
            }
        }
    }
}
