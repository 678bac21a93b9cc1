// src/error.rs

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Name of the unique constraint guarding one attempt per (student, paper).
pub const ATTEMPT_UNIQUE_CONSTRAINT: &str = "attempts_student_paper_key";

/// Global Application Error Enum.
/// Every failure leaves the service as a structured `{kind, error}` body.
#[derive(Debug)]
pub enum AppError {
    // 404 Not Found (paper or attempt absent, unpublished or archived)
    NotFound(String),

    // 422 Unprocessable Entity
    DeadlineExceeded(String),

    // 409 Conflict on (student_id, paper_id)
    DuplicateAttempt(String),

    // 400 Bad Request (malformed payload, unknown question/option)
    Validation(String),

    // 403 Forbidden
    Forbidden(String),

    // 503 Service Unavailable, storage layer failure
    Persistence(String),

    // 401 Unauthorized
    AuthError(String),

    // 409 Conflict (e.g., duplicate username)
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl AppError {
    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::DeadlineExceeded(_) => "deadline_exceeded",
            AppError::DuplicateAttempt(_) => "duplicate_attempt",
            AppError::Validation(_) => "validation_error",
            AppError::Forbidden(_) => "authorization_error",
            AppError::Persistence(_) => "persistence_error",
            AppError::AuthError(_) => "authentication_error",
            AppError::Conflict(_) => "conflict",
            AppError::InternalServerError(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DeadlineExceeded(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DuplicateAttempt(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        let (error_message, retryable) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                ("Internal Server Error".to_string(), false)
            }
            AppError::Persistence(msg) => {
                tracing::error!("Persistence error: {}", msg);
                ("Storage is temporarily unavailable".to_string(), true)
            }
            AppError::NotFound(msg)
            | AppError::DeadlineExceeded(msg)
            | AppError::DuplicateAttempt(msg)
            | AppError::Validation(msg)
            | AppError::Forbidden(msg)
            | AppError::AuthError(msg)
            | AppError::Conflict(msg) => (msg, false),
        };

        let body = if retryable {
            json!({ "kind": kind, "error": error_message, "retryable": true })
        } else {
            json!({ "kind": kind, "error": error_message })
        };

        (status, Json(body)).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError`.
/// A unique violation on the attempts constraint becomes `DuplicateAttempt`,
/// everything else is a storage failure.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation()
                && db_err.constraint() == Some(ATTEMPT_UNIQUE_CONSTRAINT)
            {
                return AppError::DuplicateAttempt(
                    "This paper has already been submitted".to_string(),
                );
            }
        }
        AppError::Persistence(err.to_string())
    }
}

/// A body that is not valid JSON, or does not match the request type, is a
/// validation failure. The message says which field was wrong.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_map_to_statuses() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "not_found"),
            (
                AppError::DeadlineExceeded("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
                "deadline_exceeded",
            ),
            (AppError::DuplicateAttempt("x".into()), StatusCode::CONFLICT, "duplicate_attempt"),
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST, "validation_error"),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN, "authorization_error"),
            (
                AppError::Persistence("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
                "persistence_error",
            ),
        ];

        for (err, status, kind) in cases {
            assert_eq!(err.status(), status);
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn test_row_not_found_is_persistence() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), "persistence_error");
    }
}
