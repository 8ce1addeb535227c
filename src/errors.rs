use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub enum AppError {
    // Database errors
    Database(sqlx::Error),
    DatabaseMigration(sqlx::migrate::MigrateError),

    // Redis errors
    Redis(redis::RedisError),

    // Counter store could not be reached or timed out
    StoreUnavailable(String),

    // Access errors
    Unauthorized,
    Forbidden,

    // Rate limiting
    RateLimitExceeded,

    // Media upload signing
    UploadAuth(String),

    // Validation errors
    ValidationError(String),

    // Configuration errors
    Configuration(String),

    // Internal errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::DatabaseMigration(e) => write!(f, "Database migration error: {}", e),
            AppError::Redis(e) => write!(f, "Redis error: {}", e),
            AppError::StoreUnavailable(msg) => write!(f, "Counter store unavailable: {}", msg),
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::Forbidden => write!(f, "Forbidden"),
            AppError::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            AppError::UploadAuth(msg) => write!(f, "Upload auth error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::DatabaseMigration(err)
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Redis(err)
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match &self {
            AppError::Database(_) | AppError::DatabaseMigration(_) => {
                tracing::error!("Database error: {:?}", self);
                "Internal server error".to_string()
            }
            AppError::Redis(_) => {
                tracing::error!("Redis error: {:?}", self);
                "Internal server error".to_string()
            }
            AppError::StoreUnavailable(_) => {
                tracing::error!("Counter store error: {}", self);
                "Service temporarily unavailable".to_string()
            }
            AppError::Unauthorized => "Unauthorized".to_string(),
            AppError::Forbidden => "Forbidden".to_string(),
            AppError::RateLimitExceeded => "Rate limit exceeded".to_string(),
            AppError::UploadAuth(_) => {
                tracing::error!("Error generating upload auth params: {}", self);
                "Failed to generate upload parameters".to_string()
            }
            AppError::ValidationError(_) => self.to_string(),
            AppError::Configuration(_) => {
                tracing::error!("Configuration error: {:?}", self);
                "Internal server error".to_string()
            }
            AppError::Internal(_) => {
                tracing::error!("Internal error: {:?}", self);
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({ "error": error_message }));

        (status, body).into_response()
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;
