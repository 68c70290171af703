use axum::http::{HeaderMap, header::AUTHORIZATION};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use time::Duration;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::ports::auth_provider::SessionUser,
};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Session token from the `access_token` cookie, else an `Authorization: Bearer` header.
pub fn access_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE)
        && !cookie.value().is_empty()
    {
        return Some(cookie.value().to_owned());
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
}

pub async fn current_user(state: &AppState, headers: &HeaderMap) -> AppResult<SessionUser> {
    let jar = CookieJar::from_headers(headers);
    let token = access_token(&jar, headers);
    state
        .auth_use_cases
        .session_user(token.as_deref())
        .await
        .ok_or(AppError::Unauthorized)
}

pub fn session_cookie(token: String, ttl: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((ACCESS_TOKEN_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .max_age(ttl)
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((ACCESS_TOKEN_COOKIE, "")).path("/").build()
}
