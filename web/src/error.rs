//! Error types for web handlers.
//!
//! [`AppError`] bridges [`BookingError`] and extractor rejections to HTTP
//! responses. Every body has the same shape:
//!
//! ```json
//! { "code": "conflict", "message": "Cannot confirm booking with status confirmed",
//!   "details": { "currentStatus": "confirmed" } }
//! ```

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use roombnb_core::error::{BookingError, ErrorKind};
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// Internal errors keep their source for logging; clients only see a generic
/// message.
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Stable machine-readable code
    code: &'static str,
    /// Error message (user-facing)
    message: String,
    /// Extra structured context
    details: Option<serde_json::Value>,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Attach structured details to the body.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// 400 for malformed input.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorKind::ValidationFailed.as_str(),
            message,
        )
    }

    /// 401 for a missing or unknown session.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthenticated", message)
    }

    /// 403 for an authenticated caller without access.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, ErrorKind::Forbidden.as_str(), message)
    }

    /// 500 with a generic message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Internal.as_str(),
            message,
        )
    }

    /// HTTP status of this error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Stable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// User-facing message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::ValidationFailed => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let kind = err.kind();
        if kind == ErrorKind::Internal {
            return Self::internal("Internal server error").with_source(err.into());
        }

        let current = err.current_status();
        let error = Self::new(status_for(kind), kind.as_str(), err.to_string());
        match current {
            Some(status) => {
                error.with_details(serde_json::json!({ "currentStatus": status.as_str() }))
            }
            None => error,
        }
    }
}

fn rejected_input(reason: &str) -> AppError {
    AppError::validation("Validation failed").with_details(serde_json::json!({ "errors": [reason] }))
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        rejected_input(&rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        rejected_input(&rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        rejected_input(&rejection.body_text())
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("Internal server error").with_source(err)
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    error = %source,
                    "Internal server error"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "Internal server error"
                ),
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
            details: self.details,
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use roombnb_core::error::StoreError;
    use roombnb_core::types::BookingStatus;

    #[test]
    fn kinds_map_to_statuses() {
        let cases = [
            (BookingError::not_found("Booking"), StatusCode::NOT_FOUND),
            (
                BookingError::forbidden("Not authorized to view this booking"),
                StatusCode::FORBIDDEN,
            ),
            (BookingError::InvalidRange, StatusCode::BAD_REQUEST),
            (BookingError::DateConflict, StatusCode::CONFLICT),
            (
                BookingError::Store(StoreError::Database("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn transition_conflict_carries_current_status() {
        let err = AppError::from(BookingError::InvalidTransition {
            message: "Cannot confirm booking with status confirmed".to_string(),
            current: BookingStatus::Confirmed,
        });
        assert_eq!(err.code(), "conflict");
        assert_eq!(
            err.details,
            Some(serde_json::json!({ "currentStatus": "confirmed" }))
        );
    }

    #[test]
    fn store_details_stay_private() {
        let err = AppError::from(BookingError::Store(StoreError::Database(
            "password authentication failed".into(),
        )));
        assert_eq!(err.message(), "Internal server error");
        assert!(err.source.is_some());
    }

    #[test]
    fn test_error_display() {
        let err = AppError::unauthorized("Authentication required");
        assert_eq!(err.to_string(), "[unauthenticated] Authentication required");
    }
}
