use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Precondition failures (`NotFound`, `Forbidden`, `MissingReason`, `Duplicate`)
/// are final — retrying cannot change the outcome. `Database` is the only kind
/// a caller may meaningfully retry; the transaction guarantees no partial state
/// was left behind.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Deliberately undifferentiated: "already transitioned" and "does not
    /// exist" require identical handling by the caller, so an idempotent
    /// retry of a terminal transition can never succeed twice.
    #[error("Not found or no longer pending: {0}")]
    NotPendingOrNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("A reason is required: {0}")]
    MissingReason(String),

    #[error("Conflict: {0}")]
    Duplicate(String),

    #[error("You cannot report your own review")]
    SelfReportForbidden,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::NotPendingOrNotFound(msg) => (
                StatusCode::CONFLICT,
                "NOT_PENDING_OR_NOT_FOUND",
                msg.clone(),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::MissingReason(msg) => {
                (StatusCode::BAD_REQUEST, "MISSING_REASON", msg.clone())
            }
            AppError::Duplicate(msg) => (StatusCode::CONFLICT, "DUPLICATE", msg.clone()),
            AppError::SelfReportForbidden => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "SELF_REPORT_FORBIDDEN",
                "You cannot report your own review".to_string(),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Access denied".to_string(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// True when the error is a storage-level unique constraint violation.
/// The schema is the final backstop against race-induced duplicate
/// relationship rows; callers map this to `Duplicate`, never a 500.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation)
    )
}

/// True when the error is a foreign key violation, e.g. inserting a
/// wishlist entry for a listing that does not exist.
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if matches!(db.kind(), sqlx::error::ErrorKind::ForeignKeyViolation)
    )
}
