use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::billing_provider::{BillingProvider, CheckoutRequest},
};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: SecretString,
    base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeCustomer {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    #[serde(rename = "type")]
    error_type: String,
    message: Option<String>,
}

impl StripeClient {
    pub fn new(client: Client, secret_key: SecretString) -> Self {
        Self::with_base_url(client, secret_key, STRIPE_API_BASE.to_string())
    }

    pub fn with_base_url(client: Client, secret_key: SecretString, base_url: String) -> Self {
        Self {
            client,
            secret_key,
            base_url,
        }
    }

    fn auth_header(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:", self.secret_key.expose_secret()));
        format!("Basic {}", encoded)
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> AppResult<T> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", self.auth_header())
            .form(params)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Stripe request failed: {}", e)))?;

        handle_response(response).await
    }

    pub async fn create_customer(&self, email: &str, user_id: &str) -> AppResult<StripeCustomer> {
        let params = vec![
            ("email".to_string(), email.to_string()),
            ("metadata[userId]".to_string(), user_id.to_string()),
        ];
        self.post_form("/customers", &params).await
    }

    pub async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> AppResult<StripeCheckoutSession> {
        let params = checkout_params(request);
        self.post_form("/checkout/sessions", &params).await
    }
}

fn checkout_params(request: &CheckoutRequest) -> Vec<(String, String)> {
    vec![
        ("customer".to_string(), request.customer_id.clone()),
        ("mode".to_string(), "subscription".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("line_items[0][price]".to_string(), request.price_id.clone()),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        ("metadata[userId]".to_string(), request.user_id.clone()),
        ("allow_promotion_codes".to_string(), "true".to_string()),
        (
            "billing_address_collection".to_string(),
            "required".to_string(),
        ),
    ]
}

async fn handle_response<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> AppResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| AppError::Provider(format!("Failed to read response: {}", e)))?;

    if !status.is_success() {
        tracing::error!(status = %status, body = %body, "Stripe API error");

        if let Ok(error) = serde_json::from_str::<StripeErrorResponse>(&body) {
            return Err(AppError::Provider(format!(
                "Stripe error: {}",
                error.error.message.unwrap_or(error.error.error_type)
            )));
        }

        return Err(AppError::Provider(format!(
            "Stripe API error: {} - {}",
            status, body
        )));
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(body = %body, error = %e, "Failed to parse Stripe response");
        AppError::Provider(format!("Failed to parse Stripe response: {}", e))
    })
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn create_customer(&self, email: &str, user_id: &str) -> AppResult<String> {
        Ok(StripeClient::create_customer(self, email, user_id).await?.id)
    }

    async fn create_checkout_session(&self, request: &CheckoutRequest) -> AppResult<String> {
        Ok(StripeClient::create_checkout_session(self, request).await?.id)
    }
}
