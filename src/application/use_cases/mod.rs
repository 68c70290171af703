pub mod auth;
pub mod billing_webhook;
pub mod checkout;
pub mod route_guard;
