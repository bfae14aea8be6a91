//! Handler for the `/token` resource (access-token refresh).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use janus_core::error::AuthError;
use janus_db::repositories::{SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::jwt::{decode_token, issue_access_token, TokenError, TokenKind};
use crate::error::{AppError, AppResult};
use crate::middleware::client::ClientMeta;
use crate::state::AppState;

/// Request body for `POST /v1/token/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Access / refresh token pair.
#[derive(Debug, Serialize)]
pub struct TokensPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// POST /v1/token/refresh
///
/// Exchange a valid refresh token for a new access token. The refresh
/// token is NOT rotated: it stays valid until its own expiry or until its
/// backing session is revoked, and is echoed back in the response pair.
pub async fn refresh(
    State(state): State<AppState>,
    client: ClientMeta,
    Json(input): Json<RefreshRequest>,
) -> AppResult<(StatusCode, Json<TokensPair>)> {
    // 1. Decode; expiry and malformation are distinct outcomes.
    let claims = decode_token(&state.config.jwt, &input.refresh_token).map_err(|e| match e {
        TokenError::Expired => AuthError::TokenExpired,
        TokenError::Malformed => AuthError::TokenMalformed,
    })?;

    // 2. Explicit type check: an access token cannot mint access tokens.
    if claims.token_type != TokenKind::Refresh {
        return Err(AuthError::WrongTokenType.into());
    }

    // 3. The jti must name a live session -- the session row is the sole
    //    source of refresh validity. A malformed id can never match one.
    let session_uuid =
        Uuid::parse_str(&claims.jti).map_err(|_| AuthError::SessionNotFound)?;
    let session = SessionRepo::find_by_uuid(&state.pool, session_uuid)
        .await?
        .ok_or(AuthError::SessionNotFound)?;

    // 4. Record where this refresh came from.
    SessionRepo::touch(
        &state.pool,
        session.uuid,
        client.ip.as_deref(),
        client.user_agent.as_deref(),
    )
    .await?;

    // 5. Issue a new access token snapshotting the user's current state.
    let user = UserRepo::find_by_uuid(&state.pool, session.user_uuid)
        .await?
        .ok_or(AuthError::UserNotFound)?;
    let access_token = issue_access_token(&state.config.jwt, user.uuid, user.is_active, session.uuid)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok((
        StatusCode::CREATED,
        Json(TokensPair {
            access_token,
            refresh_token: input.refresh_token,
        }),
    ))
}
