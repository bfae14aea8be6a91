//! HTTP handlers for the authentication flows.

pub mod code;
pub mod health;
pub mod password;
pub mod session;
pub mod token;
pub mod user;

use janus_core::error::AuthError;
use janus_core::types::DbId;
use janus_db::models::user::{User, UserResponse};
use janus_db::repositories::UserRepo;
use serde::Serialize;

use crate::auth::jwt::{issue_access_token, issue_refresh_token, JwtConfig};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthClaims;

/// Successful authentication response returned by register, login,
/// code-confirm, and password-reset-confirm: public user info flattened
/// alongside a fresh token pair bound to one new session.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Issue an access/refresh pair bound to the given session and assemble
/// the response body.
pub(crate) fn build_auth_response(
    config: &JwtConfig,
    user: &User,
    session_uuid: DbId,
) -> AppResult<AuthResponse> {
    let access_token = issue_access_token(config, user.uuid, user.is_active, session_uuid)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    let refresh_token = issue_refresh_token(config, user.uuid, session_uuid)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(AuthResponse {
        user: UserResponse::from(user),
        access_token,
        refresh_token,
        expires_in: config.access_token_lifetime_mins * 60,
    })
}

/// Resolve validated access-token claims to a live user row.
///
/// A subject that no longer exists (or was soft-deleted since issuance)
/// fails with `UserNotFound`.
pub(crate) async fn resolve_current_user(
    pool: &janus_db::DbPool,
    claims: &AuthClaims,
) -> AppResult<User> {
    UserRepo::find_by_uuid(pool, claims.user_uuid)
        .await?
        .ok_or_else(|| AuthError::UserNotFound.into())
}
