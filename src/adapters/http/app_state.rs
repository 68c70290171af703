use std::sync::Arc;

use crate::{
    application::use_cases::{
        auth::AuthUseCases, billing_webhook::BillingWebhookUseCases, checkout::CheckoutUseCases,
        route_guard::RoutePolicy,
    },
    infra::{RateLimiter, config::AppConfig},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth_use_cases: Arc<AuthUseCases>,
    pub billing_webhook_use_cases: Arc<BillingWebhookUseCases>,
    pub checkout_use_cases: Arc<CheckoutUseCases>,
    pub route_policy: Arc<RoutePolicy>,
    pub rate_limiter: Arc<dyn RateLimiter>,
}
