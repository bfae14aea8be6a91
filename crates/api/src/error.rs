//! Application-level error type for HTTP handlers.
//!
//! Wraps the domain [`AuthError`] taxonomy and adds database/internal
//! variants. [`IntoResponse`] resolves every kind to its fixed HTTP status
//! and a JSON body of shape `{"detail": [{"type": ..., "msg": ...}]}` --
//! the `type` field is the stable discriminator clients and tests key on.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use janus_core::error::{AuthError, FieldError};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `janus_core`.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An internal error with a human-readable message. Never shown to the
    /// caller; logged and converted to a generic 500.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Auth(auth) => auth_response(auth),
            AppError::Database(err) => sqlx_response(&err),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal_response()
            }
        }
    }
}

/// Fixed HTTP status for each domain error kind.
fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::Forbidden => StatusCode::FORBIDDEN,
        AuthError::TokenMalformed => StatusCode::UNAUTHORIZED,
        AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
        AuthError::WrongTokenType => StatusCode::BAD_REQUEST,
        AuthError::SessionNotFound => StatusCode::UNAUTHORIZED,
        AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
        AuthError::DuplicateUsername => StatusCode::BAD_REQUEST,
        AuthError::DuplicateEmail => StatusCode::BAD_REQUEST,
        AuthError::DirectorySyncFailed => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::ConfirmationCodeInvalid => StatusCode::BAD_REQUEST,
        AuthError::PasswordResetCodeInvalid => StatusCode::BAD_REQUEST,
        AuthError::PasswordResetUserNotFound => StatusCode::BAD_REQUEST,
        AuthError::PasswordResetException => StatusCode::BAD_GATEWAY,
        AuthError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AuthError::NotFound => StatusCode::NOT_FOUND,
    }
}

fn auth_response(err: AuthError) -> Response {
    let status = auth_status(&err);
    tracing::info!(error_type = err.error_type(), status = %status, "Request failed");

    let detail: Vec<serde_json::Value> = match &err {
        AuthError::ValidationFailed(errors) => errors.iter().map(field_entry).collect(),
        other => vec![json!({ "type": other.error_type(), "msg": other.to_string() })],
    };

    (status, axum::Json(json!({ "detail": detail }))).into_response()
}

fn field_entry(err: &FieldError) -> serde_json::Value {
    json!({ "type": err.error_type, "msg": err.msg })
}

/// Classify a sqlx error.
///
/// - `RowNotFound` maps to 404.
/// - Unique violations on the `uq_users_*` indexes map to the matching
///   duplicate error (a second line of defense behind the point lookups,
///   for races between concurrent registrations).
/// - Everything else maps to 500 with a sanitized message.
fn sqlx_response(err: &sqlx::Error) -> Response {
    match err {
        sqlx::Error::RowNotFound => auth_response(AuthError::NotFound),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505.
            if db_err.code().as_deref() == Some("23505") {
                match db_err.constraint() {
                    Some("uq_users_username") => {
                        return auth_response(AuthError::DuplicateUsername)
                    }
                    Some("uq_users_email") => return auth_response(AuthError::DuplicateEmail),
                    _ => {}
                }
            }
            tracing::error!(error = %db_err, "Database error");
            internal_response()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal_response()
        }
    }
}

fn internal_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        axum::Json(json!({
            "detail": [{ "type": "internal_error", "msg": "An internal error occurred" }]
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            auth_status(&AuthError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(auth_status(&AuthError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            auth_status(&AuthError::WrongTokenType),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            auth_status(&AuthError::DirectorySyncFailed),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            auth_status(&AuthError::PasswordResetException),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            auth_status(&AuthError::ValidationFailed(vec![])),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
