/// Unified error types for the Campanile API
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the API
#[derive(Error, Debug)]
pub enum ApiError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authorization errors
    #[error("Not authorized: {0}")]
    Forbidden(String),

    /// Validation errors with a single message
    #[error("Validation error: {0}")]
    Validation(String),

    /// Validation errors keyed by field
    #[error("Validation failed")]
    Fields(Vec<FieldError>),

    /// Operation not permitted in the entity's current lifecycle state
    #[error("{0}")]
    InvalidState(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (uniqueness or idempotency violations)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Event capacity reached
    #[error("Capacity exceeded: {0}")]
    Capacity(String),

    /// Rate limiting errors
    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after: std::time::Duration },

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JWT errors
    #[error("JWT error: {0}")]
    Jwt(String),
}

/// One entry of a field-keyed validation failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// JSON error response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

/// Convert ApiError to HTTP response
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, fields) = match self {
            ApiError::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "AuthenticationRequired",
                self.to_string(),
                None,
            ),
            ApiError::Jwt(_) => (
                StatusCode::UNAUTHORIZED,
                "InvalidToken",
                self.to_string(),
                None,
            ),
            ApiError::Forbidden(_) => {
                (StatusCode::FORBIDDEN, "Forbidden", self.to_string(), None)
            }
            ApiError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
                None,
            ),
            ApiError::Fields(errors) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                "Validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InvalidState(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidState",
                self.to_string(),
                None,
            ),
            ApiError::NotFound(_) => {
                (StatusCode::NOT_FOUND, "NotFound", self.to_string(), None)
            }
            ApiError::Conflict(_) => {
                (StatusCode::CONFLICT, "Conflict", self.to_string(), None)
            }
            ApiError::Capacity(_) => (
                StatusCode::CONFLICT,
                "CapacityExceeded",
                self.to_string(),
                None,
            ),
            ApiError::RateLimitExceeded { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RateLimitExceeded",
                "Rate limit exceeded".to_string(),
                None,
            ),
            ApiError::Database(_) | ApiError::Internal(_) | ApiError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            fields,
        });

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                fields.push(FieldError::new(field.to_string(), message));
            }
        }
        ApiError::Fields(fields)
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;
