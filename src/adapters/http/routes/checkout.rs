use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    adapters::http::{app_state::AppState, session::current_user},
    app_error::AppError,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutPayload {
    #[serde(default)]
    price_id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/create-checkout-session", post(create_checkout_session))
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// POST /api/create-checkout-session
async fn create_checkout_session(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CheckoutPayload>, JsonRejection>,
) -> Response {
    let price_id = match payload {
        Ok(Json(CheckoutPayload {
            price_id: Some(price_id),
        })) if !price_id.trim().is_empty() => price_id,
        _ => return error(StatusCode::BAD_REQUEST, "Price ID is required"),
    };

    let user = match current_user(&app_state, &headers).await {
        Ok(user) => user,
        Err(_) => return error(StatusCode::UNAUTHORIZED, "Unauthorized"),
    };

    match app_state
        .checkout_use_cases
        .create_session(&user, &price_id)
        .await
    {
        Ok(session_id) => (StatusCode::OK, Json(json!({ "sessionId": session_id }))).into_response(),
        Err(AppError::InvalidInput(msg)) => error(StatusCode::BAD_REQUEST, &msg),
        Err(e) => {
            tracing::error!(error = %e, user_id = %user.id, "Error creating checkout session");
            error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error creating checkout session",
            )
        }
    }
}
