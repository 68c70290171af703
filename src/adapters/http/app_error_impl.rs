use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidSignature | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::SubscriptionNotFound(_) => StatusCode::CONFLICT,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Database(_) | AppError::Provider(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidSignature => ErrorCode::InvalidSignature,
            AppError::Unauthorized => ErrorCode::Unauthorized,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::SubscriptionNotFound(_) => ErrorCode::SubscriptionNotFound,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::RateLimited => ErrorCode::RateLimited,
            AppError::Provider(_) => ErrorCode::ProviderError,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log the error before it gets converted into a status response.
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }

        // Server-side details stay in the logs.
        let message = match &self {
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::Database(_) => "Database error".to_string(),
            AppError::Provider(_) | AppError::Internal(_) => "Internal error".to_string(),
            other => other.to_string(),
        };

        error_resp(status, self.code(), message)
    }
}

pub fn error_resp(status: StatusCode, code: ErrorCode, message: String) -> Response {
    let body = serde_json::json!({ "error": message, "code": code.as_str() });
    (status, Json(body)).into_response()
}
