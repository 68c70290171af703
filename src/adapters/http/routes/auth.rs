use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    adapters::http::{
        app_state::AppState,
        session::{access_token, current_user, removal_cookie, session_cookie},
    },
    app_error::AppResult,
    application::ports::auth_provider::AuthSession,
};

#[derive(Deserialize)]
struct SignUpPayload {
    email: String,
    password: String,
    name: String,
}

#[derive(Deserialize)]
struct SignInPayload {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct ResetPasswordPayload {
    email: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(sign_up))
        .route("/signin", post(sign_in))
        .route("/signout", post(sign_out))
        .route("/reset-password", post(reset_password))
        .route("/me", get(me))
}

/// Set the session cookie when the provider issued a token. Sign-ups that
/// need email confirmation come back without one.
fn with_session(
    app_state: &AppState,
    jar: CookieJar,
    session: AuthSession,
) -> (CookieJar, Json<Value>) {
    let confirmation_required = session.access_token.is_none();
    let jar = match session.access_token {
        Some(token) => jar.add(session_cookie(
            token,
            app_state.config.session_ttl,
            app_state.config.secure_cookies(),
        )),
        None => jar,
    };
    (
        jar,
        Json(json!({
            "user": session.user,
            "confirmationRequired": confirmation_required,
        })),
    )
}

async fn sign_up(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SignUpPayload>,
) -> AppResult<impl IntoResponse> {
    let session = app_state
        .auth_use_cases
        .sign_up(&payload.email, &payload.password, &payload.name)
        .await?;
    Ok(with_session(&app_state, jar, session))
}

async fn sign_in(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SignInPayload>,
) -> AppResult<impl IntoResponse> {
    let session = app_state
        .auth_use_cases
        .sign_in(&payload.email, &payload.password)
        .await?;
    Ok(with_session(&app_state, jar, session))
}

async fn sign_out(
    State(app_state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let token = access_token(&jar, &headers);
    app_state.auth_use_cases.sign_out(token.as_deref()).await?;
    Ok((jar.remove(removal_cookie()), StatusCode::NO_CONTENT))
}

async fn reset_password(
    State(app_state): State<AppState>,
    Json(payload): Json<ResetPasswordPayload>,
) -> AppResult<impl IntoResponse> {
    app_state
        .auth_use_cases
        .reset_password(&payload.email)
        .await?;
    Ok(StatusCode::ACCEPTED)
}

async fn me(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let user = current_user(&app_state, &headers).await?;
    Ok(Json(json!({ "user": user })))
}
