//! Handler for the `/code` resource (email-activation confirmation).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use janus_core::error::AuthError;
use janus_db::models::session::CreateSession;
use janus_db::repositories::{SessionRepo, UserRepo};
use serde::Deserialize;

use crate::codes::CodePurpose;
use crate::error::{AppError, AppResult};
use crate::handlers::{build_auth_response, AuthResponse};
use crate::middleware::client::ClientMeta;
use crate::state::AppState;

/// Request body for `POST /v1/code/confirm`.
#[derive(Debug, Deserialize)]
pub struct ConfirmCodeRequest {
    pub code: String,
}

/// POST /v1/code/confirm
///
/// Redeem an email-activation code: stamp the email channel as confirmed,
/// activate the account (email is the only required channel), propagate
/// the change to the directory, and return a fresh token pair whose access
/// token already carries `is_active = true`.
pub async fn confirm(
    State(state): State<AppState>,
    client: ClientMeta,
    Json(input): Json<ConfirmCodeRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    // 1. Atomic redemption; a code bound to another purpose is just as
    //    invalid as an unknown one.
    let redeemed = state
        .codes
        .redeem(&input.code)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    let (user_uuid, purpose) = redeemed.ok_or(AuthError::ConfirmationCodeInvalid)?;
    if purpose != CodePurpose::EmailActivation {
        return Err(AuthError::ConfirmationCodeInvalid.into());
    }

    let user = UserRepo::find_by_uuid(&state.pool, user_uuid)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    // 2. Activation, directory propagation, and the new session commit
    //    together or not at all.
    let mut tx = state.pool.begin().await?;

    UserRepo::confirm_email(&mut *tx, user.uuid).await?;
    // Email is the only confirmation channel, so confirming it completes
    // activation.
    UserRepo::activate(&mut *tx, user.uuid).await?;

    let mut activated_user = user.clone();
    activated_user.is_active = true;
    if let Err(e) = state.directory.update_remote_user(&activated_user).await {
        tracing::error!(
            username = %user.username,
            error = %e,
            "Activation rolled back: directory update failed"
        );
        return Err(AuthError::DirectorySyncFailed.into());
    }
    UserRepo::mark_synced(&mut *tx, user.uuid).await?;

    let session = SessionRepo::create(
        &mut *tx,
        &CreateSession {
            user_uuid: user.uuid,
            ip: client.ip,
            useragent: client.user_agent,
        },
    )
    .await?;

    tx.commit().await?;

    tracing::info!(username = %user.username, "Account activated");
    let response = build_auth_response(&state.config.jwt, &activated_user, session.uuid)?;
    Ok((StatusCode::CREATED, Json(response)))
}
