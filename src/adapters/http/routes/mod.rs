pub mod auth;
pub mod checkout;
pub mod health;
pub mod webhook;

use axum::Router;

use crate::adapters::http::app_state::AppState;

/// Routes mounted under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .merge(checkout::router())
        .merge(health::router())
        .merge(webhook::router())
}
