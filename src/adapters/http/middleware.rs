use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::{
    adapters::http::{app_state::AppState, session::access_token},
    app_error::AppError,
    application::use_cases::route_guard::{GuardDecision, RouteClass, is_static_asset},
};

/// Path exempt from rate limiting; the billing provider retries on its own schedule.
const WEBHOOK_PATH: &str = "/api/stripe/webhook";

/// Redirects page requests according to the route policy and session presence.
pub async fn route_guard_middleware(
    State(app_state): State<AppState>,
    cookies: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    if is_static_asset(&path) {
        return next.run(request).await;
    }

    let policy = &app_state.route_policy;
    // Only classified paths need a session lookup.
    if policy.classify(&path) == RouteClass::Unclassified {
        return next.run(request).await;
    }

    let token = access_token(&cookies, request.headers());
    let has_session = app_state
        .auth_use_cases
        .session_user(token.as_deref())
        .await
        .is_some();

    match policy.decide(&path, has_session) {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::Redirect(location) => {
            tracing::debug!(path = %path, has_session, location = %location, "Route guard redirect");
            Redirect::temporary(&location).into_response()
        }
    }
}

/// Per-IP limit on `/api/` requests.
pub async fn rate_limit_middleware(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path();
    if !path.starts_with("/api/") || path == WEBHOOK_PATH {
        return Ok(next.run(request).await);
    }

    let connect_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    // Only trust forwarded headers if explicitly configured (when behind a reverse proxy)
    let ip = if app_state.config.trust_proxy {
        forwarded_ip(&request).or(connect_ip)
    } else {
        connect_ip
    }
    .unwrap_or_else(|| "unknown".to_string());

    tracing::debug!(
        trust_proxy = app_state.config.trust_proxy,
        using_ip = %ip,
        "Rate limiting request"
    );

    app_state.rate_limiter.check(&ip).await?;

    Ok(next.run(request).await)
}

fn forwarded_ip(req: &Request) -> Option<String> {
    // Extract IP from X-Forwarded-For or X-Real-IP headers
    if let Some(forwarded) = req.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let trimmed = first.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    if let Some(real) = req.headers().get("x-real-ip")
        && let Ok(val) = real.to_str()
        && !val.trim().is_empty()
    {
        return Some(val.trim().to_string());
    }
    None
}
