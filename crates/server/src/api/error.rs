//! Structured procedure errors.
//!
//! Every `/api` failure surfaces as a `{ code, message, fields? }` JSON
//! body with a code from a fixed set, so clients can branch on the code
//! without parsing prose. Validation failures carry per-field errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::db::RepositoryError;

/// Fixed set of procedure error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Missing or insufficient privileges. Also used for role failures so
    /// the code does not disclose what exists behind the gate.
    Unauthorized,
    /// The addressed entity does not exist.
    NotFound,
    /// Input failed schema validation; see `fields`.
    BadRequest,
    /// The operation lost to a concurrent conflicting write.
    Conflict,
    /// Unexpected server-side failure.
    Internal,
}

impl ErrorCode {
    /// HTTP status this code maps to.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A single invalid input field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    /// Name of the offending field.
    pub field: String,
    /// What constraint it violated.
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A structured procedure rejection.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable summary.
    pub message: String,
    /// Per-field validation errors, present only for `BAD_REQUEST`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl ApiError {
    /// Create an error with a code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// An `UNAUTHORIZED` rejection with the standard message.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::Unauthorized, "unauthorized")
    }

    /// A `NOT_FOUND` rejection naming the missing entity kind.
    #[must_use]
    pub fn not_found(entity: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("{entity} not found"))
    }

    /// A `BAD_REQUEST` rejection carrying field-level errors.
    #[must_use]
    pub fn bad_request(fields: Vec<FieldError>) -> Self {
        Self {
            code: ErrorCode::BadRequest,
            message: "invalid input".to_owned(),
            fields,
        }
    }

    /// The rejection for a gate decision code, with the standard message.
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Self {
        match code {
            ErrorCode::Unauthorized => Self::unauthorized(),
            ErrorCode::NotFound => Self::new(code, "not found"),
            ErrorCode::BadRequest => Self::new(code, "invalid input"),
            ErrorCode::Conflict => Self::new(code, "conflict"),
            ErrorCode::Internal => Self::new(code, "internal error"),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::new(ErrorCode::NotFound, "not found"),
            RepositoryError::Conflict(message) => Self::new(ErrorCode::Conflict, message),
            err @ (RepositoryError::Database(_) | RepositoryError::DataCorruption(_)) => {
                let event_id = sentry::capture_error(&err);
                tracing::error!(
                    error = %err,
                    sentry_event_id = %event_id,
                    "Procedure repository error"
                );
                // Don't expose internal error details to clients
                Self::new(ErrorCode::Internal, "internal error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_serialize_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::Unauthorized).unwrap(),
            "\"UNAUTHORIZED\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorCode::BadRequest).unwrap(),
            "\"BAD_REQUEST\""
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::Conflict.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_field_errors_only_serialized_when_present() {
        let plain = serde_json::to_value(ApiError::unauthorized()).unwrap();
        assert!(plain.get("fields").is_none());

        let invalid = ApiError::bad_request(vec![FieldError::new("content", "too long")]);
        let body = serde_json::to_value(invalid).unwrap();
        assert_eq!(body["code"], "BAD_REQUEST");
        assert_eq!(body["fields"][0]["field"], "content");
    }

    #[test]
    fn test_repository_not_found_maps_to_not_found_code() {
        let err: ApiError = RepositoryError::NotFound.into();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
