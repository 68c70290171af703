use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Too many requests. Please slow down.")]
    RateLimited,

    #[error("Payment provider error: {0}")]
    Provider(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Transient failures: a retry by the caller (or the webhook sender) may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Database(_) => true,
            AppError::Provider(_) => true,
            AppError::Internal(_) => true,
            AppError::RateLimited => true,

            AppError::InvalidSignature => false,
            AppError::Unauthorized => false,
            AppError::InvalidInput(_) => false,
            AppError::SubscriptionNotFound(_) => false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ErrorCode {
    InvalidSignature,
    Unauthorized,
    InvalidInput,
    SubscriptionNotFound,
    DatabaseError,
    RateLimited,
    ProviderError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidSignature => "INVALID_SIGNATURE",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::SubscriptionNotFound => "SUBSCRIPTION_NOT_FOUND",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::ProviderError => "PROVIDER_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
