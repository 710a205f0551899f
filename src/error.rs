use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error types with appropriate HTTP status codes.
///
/// # Request-level failures
///
/// Every failure in the gateway is terminal for the request that triggered
/// it - a stale token or an unknown mapping cannot self-resolve within one
/// request lifecycle, so nothing here is retried internally. None of these
/// errors is fatal to the process.
#[derive(Error, Debug)]
pub enum AppError {
    /// No obfuscated/canonical correspondence exists for the given path.
    #[error("no mapping for path: {0}")]
    UnknownMapping(String),

    /// Freshness token failed validation (expired, from the future, or
    /// simply wrong for the path it was presented against).
    #[error("invalid or expired access token")]
    InvalidToken,

    /// The `X-Timestamp` header was present but not parseable as an integer.
    #[error("malformed timestamp header: {0}")]
    MalformedTimestamp(String),

    /// Missing or invalid API key on an authenticated endpoint.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body for API endpoints.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log full details server-side; clients only see sanitized bodies.
        // In particular, a mapping miss must never echo the known obfuscated
        // paths back to the client - that would defeat the obfuscation.
        let (status, error_type, message) = match &self {
            AppError::UnknownMapping(path) => {
                tracing::debug!(path = %path, "no mapping for requested path");
                (StatusCode::NOT_FOUND, "not_found", "Endpoint not found")
            }
            AppError::InvalidToken => {
                tracing::warn!("access token rejected");
                (StatusCode::FORBIDDEN, "invalid_token", "Invalid access token")
            }
            AppError::MalformedTimestamp(raw) => {
                tracing::debug!(raw = %raw, "unparseable timestamp header");
                (
                    StatusCode::BAD_REQUEST,
                    "bad_timestamp",
                    "Invalid timestamp format",
                )
            }
            AppError::Unauthorized(_) => {
                tracing::warn!(error = %self, "unauthorized request");
                (
                    StatusCode::UNAUTHORIZED,
                    "unauthorized",
                    "Valid API key required",
                )
            }
            AppError::ConfigError(_) => {
                tracing::error!(error = %self, "configuration error surfaced at request time");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "config_error",
                    "Service configuration error. Please contact support.",
                )
            }
            AppError::Internal(_) => {
                tracing::error!(error = %self, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred.",
                )
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: message.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
