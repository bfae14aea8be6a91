//! Bearer access-token extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use janus_core::error::AuthError;
use janus_core::types::DbId;
use uuid::Uuid;

use crate::auth::jwt::{decode_token, TokenError, TokenKind};
use crate::error::AppError;
use crate::state::AppState;

/// Validated access-token claims extracted from the `Authorization` header.
///
/// Use this as an extractor parameter in any handler that requires
/// authentication. The distinction between rejection kinds matters:
///
/// - no credential at all (missing header, or no `Bearer ` prefix) -> 403
/// - a credential that fails validation -> 401 (expired vs. invalid)
/// - a refresh token where an access token is required -> 400
///
/// Resolving the subject to a live user row is a separate step
/// ([`crate::handlers::resolve_current_user`]) so handlers that only need
/// the claims skip the lookup.
#[derive(Debug, Clone)]
pub struct AuthClaims {
    /// The subject user's id (from `claims.user_id`).
    pub user_uuid: DbId,
    /// The session the token was issued against (from `claims.jti`), when
    /// it parses as a session id. Used to keep the caller's own session
    /// alive during bulk revocation.
    pub session_uuid: Option<DbId>,
    /// The active-flag snapshot taken at issuance.
    pub is_active: bool,
}

impl FromRequestParts<AppState> for AuthClaims {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // No usable bearer credential at all is Forbidden, distinct from a
        // bad credential.
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::Forbidden)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::Forbidden)?;

        let claims = decode_token(&state.config.jwt, token).map_err(|e| match e {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Malformed => AuthError::TokenMalformed,
        })?;

        if claims.token_type != TokenKind::Access {
            return Err(AuthError::WrongTokenType.into());
        }

        // A subject that is not a well-formed id can never resolve to a user.
        let user_uuid =
            Uuid::parse_str(&claims.user_id).map_err(|_| AuthError::UserNotFound)?;

        Ok(AuthClaims {
            user_uuid,
            session_uuid: Uuid::parse_str(&claims.jti).ok(),
            is_active: claims.is_active,
        })
    }
}
