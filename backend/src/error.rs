use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ElimuError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("Token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ElimuResult<T> = Result<T, ElimuError>;

/// Unique-constraint violations surface as conflicts, not opaque 500s.
fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

impl IntoResponse for ElimuError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ElimuError::Database(ref e) if is_unique_violation(e) => (
                StatusCode::CONFLICT,
                "A record with the same unique value already exists.".to_string(),
            ),
            ElimuError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred.".to_string(),
                )
            }
            ElimuError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            ElimuError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ElimuError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ElimuError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ElimuError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ElimuError::Jwt(_) => (
                StatusCode::UNAUTHORIZED,
                "Invalid or expired token.".to_string(),
            ),
            ElimuError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
            other => {
                tracing::error!("Unhandled error: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
