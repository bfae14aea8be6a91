//! Handlers for the `/session` resource (list, bulk revoke, revoke one).
//!
//! All endpoints require a valid, unexpired access token. Deletion is
//! scoped to the caller's own sessions; a foreign session id behaves
//! exactly like a nonexistent one.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use janus_core::error::AuthError;
use janus_db::models::session::SessionResponse;
use janus_db::repositories::SessionRepo;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::resolve_current_user;
use crate::middleware::auth::AuthClaims;
use crate::state::AppState;

/// Query parameters for `DELETE /v1/session/`.
#[derive(Debug, Deserialize)]
pub struct DeleteAllParams {
    /// Keep the session the current access token was issued against.
    #[serde(default)]
    pub except_current: bool,
}

/// GET /v1/session/
///
/// List all of the current user's sessions, most recently active first.
pub async fn list(
    State(state): State<AppState>,
    claims: AuthClaims,
) -> AppResult<Json<Vec<SessionResponse>>> {
    let user = resolve_current_user(&state.pool, &claims).await?;
    let sessions = SessionRepo::list_by_user(&state.pool, user.uuid).await?;
    Ok(Json(sessions.iter().map(SessionResponse::from).collect()))
}

/// DELETE /v1/session/?except_current=bool
///
/// Revoke all of the current user's sessions ("logout everywhere"),
/// optionally keeping the one backing the presented access token.
/// Returns 204 No Content.
pub async fn delete_all(
    State(state): State<AppState>,
    claims: AuthClaims,
    Query(params): Query<DeleteAllParams>,
) -> AppResult<StatusCode> {
    let user = resolve_current_user(&state.pool, &claims).await?;

    let exclude: Vec<_> = if params.except_current {
        claims.session_uuid.into_iter().collect()
    } else {
        Vec::new()
    };
    let removed = SessionRepo::delete_for_user(&state.pool, user.uuid, &exclude).await?;
    tracing::info!(user_uuid = %user.uuid, removed, "Bulk session revocation");

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/session/{uuid}
///
/// Revoke exactly one session iff it belongs to the current user; anything
/// else (including another user's session id) reports not-found. Returns
/// 204 No Content.
pub async fn delete_one(
    State(state): State<AppState>,
    claims: AuthClaims,
    Path(session_uuid): Path<Uuid>,
) -> AppResult<StatusCode> {
    let user = resolve_current_user(&state.pool, &claims).await?;

    let deleted = SessionRepo::delete_one(&state.pool, user.uuid, session_uuid).await?;
    if !deleted {
        return Err(AuthError::NotFound.into());
    }

    Ok(StatusCode::NO_CONTENT)
}
