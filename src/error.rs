//! Service error types with HTTP status code mapping.
//!
//! [`TaskboardError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: name is required",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see [`TaskboardError`] code ranges).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category              | HTTP Status                  |
/// |-----------|-----------------------|------------------------------|
/// | 1000–1999 | Validation            | 400 Bad Request              |
/// | 2000–2999 | Not Found / Conflict  | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server                | 500 Internal Server Error    |
/// | 4000–4999 | Auth                  | 401 Unauthorized / 403 Forbidden |
#[derive(Debug, thiserror::Error)]
pub enum TaskboardError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A task status string was not one of the known statuses.
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// A role string was not one of the known roles.
    #[error("invalid role: {0}")]
    InvalidRole(String),

    /// A date string could not be parsed.
    #[error("invalid date format: {0}")]
    InvalidDate(String),

    /// User with the given ID was not found.
    #[error("user not found: {0}")]
    UserNotFound(i64),

    /// Task with the given ID was not found.
    #[error("task not found: {0}")]
    TaskNotFound(i64),

    /// Task template with the given ID was not found.
    #[error("task template not found: {0}")]
    TemplateNotFound(i64),

    /// Unique constraint violated (username or email already taken).
    #[error("{0}")]
    Conflict(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Username/password pair did not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed or expired session token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated caller is not allowed to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl TaskboardError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidStatus(_) => 1002,
            Self::InvalidRole(_) => 1003,
            Self::InvalidDate(_) => 1004,
            Self::UserNotFound(_) => 2001,
            Self::TaskNotFound(_) => 2002,
            Self::TemplateNotFound(_) => 2003,
            Self::Conflict(_) => 2009,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::InvalidCredentials => 4001,
            Self::Unauthorized(_) => 4002,
            Self::Forbidden(_) => 4003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidStatus(_)
            | Self::InvalidRole(_)
            | Self::InvalidDate(_) => StatusCode::BAD_REQUEST,
            Self::UserNotFound(_) | Self::TaskNotFound(_) | Self::TemplateNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidCredentials | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl From<sqlx::Error> for TaskboardError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for TaskboardError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        let err = TaskboardError::InvalidStatus("done".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), 1002);
    }

    #[test]
    fn auth_errors_map_to_4xx() {
        assert_eq!(
            TaskboardError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            TaskboardError::Forbidden("nope".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn conflict_message_is_verbatim() {
        let err = TaskboardError::Conflict("username already exists".to_string());
        assert_eq!(err.to_string(), "username already exists");
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn into_response_carries_status_and_body() {
        let response = TaskboardError::TaskNotFound(7).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read failed");
        };
        let Ok(json) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
            panic!("body is not json");
        };
        assert_eq!(json["error"]["code"], 2002);
        assert_eq!(json["error"]["message"], "task not found: 7");
    }
}
