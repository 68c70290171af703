use async_trait::async_trait;

use crate::app_error::AppResult;

/// Parameters for a subscription-mode hosted checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub customer_id: String,
    pub price_id: String,
    pub user_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Outbound operations against the payments provider.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Create a provider customer and return its id.
    async fn create_customer(&self, email: &str, user_id: &str) -> AppResult<String>;

    /// Create a checkout session and return its id.
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> AppResult<String>;
}
