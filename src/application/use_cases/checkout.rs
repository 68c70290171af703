use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        analytics::Analytics,
        ports::{
            auth_provider::SessionUser,
            billing_provider::{BillingProvider, CheckoutRequest},
        },
    },
    props,
};

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_stripe_customer_id(&self, user_id: &str) -> AppResult<Option<String>>;

    /// Link a provider customer to the user, creating the user row if needed.
    async fn set_stripe_customer_id(
        &self,
        user_id: &str,
        email: &str,
        stripe_customer_id: &str,
    ) -> AppResult<()>;
}

#[derive(Clone)]
pub struct CheckoutUseCases {
    user_repo: Arc<dyn UserRepo>,
    billing_provider: Arc<dyn BillingProvider>,
    analytics: Arc<Analytics>,
    app_origin: Url,
}

impl CheckoutUseCases {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        billing_provider: Arc<dyn BillingProvider>,
        analytics: Arc<Analytics>,
        app_origin: Url,
    ) -> Self {
        Self {
            user_repo,
            billing_provider,
            analytics,
            app_origin,
        }
    }

    /// Create a subscription checkout session for `user` and return its id.
    pub async fn create_session(&self, user: &SessionUser, price_id: &str) -> AppResult<String> {
        let price_id = price_id.trim();
        if price_id.is_empty() {
            return Err(AppError::InvalidInput("Price ID is required".into()));
        }

        let customer_id = self.get_or_create_customer(user).await?;

        let origin = self.app_origin.as_str().trim_end_matches('/');
        let request = CheckoutRequest {
            customer_id,
            price_id: price_id.to_string(),
            user_id: user.id.clone(),
            success_url: format!("{}/dashboard?session_id={{CHECKOUT_SESSION_ID}}", origin),
            cancel_url: format!("{}/pricing", origin),
        };

        let session_id = self.billing_provider.create_checkout_session(&request).await?;

        tracing::info!(user_id = %user.id, price_id, session_id = %session_id, "Checkout session created");
        self.analytics.track_user_action(
            "checkout_started",
            props! { "user_id" => user.id, "price_id" => price_id },
        );

        Ok(session_id)
    }

    async fn get_or_create_customer(&self, user: &SessionUser) -> AppResult<String> {
        if let Some(existing) = self.user_repo.get_stripe_customer_id(&user.id).await? {
            return Ok(existing);
        }

        let customer_id = self
            .billing_provider
            .create_customer(&user.email, &user.id)
            .await?;
        self.user_repo
            .set_stripe_customer_id(&user.id, &user.email, &customer_id)
            .await?;

        tracing::info!(user_id = %user.id, customer_id = %customer_id, "Created billing customer");
        Ok(customer_id)
    }
}
