use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use hotpush_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from the engine.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = classify(&self);
        let body = json!({
            "error": message,
            "code": code,
        });
        (status, axum::Json(body)).into_response()
    }
}

/// Map an error to an HTTP status, stable error code, and message.
///
/// NotFound stays distinguishable from "no update available": an unknown
/// deployment key is a 404, while rollout suppression and already-current
/// clients get a 200 with `is_available == false` from the handler.
fn classify(err: &AppError) -> (StatusCode, &'static str, String) {
    match err {
        AppError::Core(core) => match core {
            CoreError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", core.to_string())
            }
            CoreError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            CoreError::DataIntegrity(msg) => {
                tracing::error!(error = %msg, "Data integrity error reached a handler");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATA_INTEGRITY",
                    "A stored record is malformed".to_string(),
                )
            }
            CoreError::StoreUnavailable(msg) => {
                tracing::error!(error = %msg, "Blob store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORE_UNAVAILABLE",
                    "Blob store unavailable".to_string(),
                )
            }
            CoreError::Io(e) => {
                tracing::error!(error = %e, "I/O error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "IO_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            CoreError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal core error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        },

        AppError::Database(err) => classify_sqlx_error(err),

        AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        AppError::InternalError(msg) => {
            tracing::error!(error = %msg, "Internal error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
