//! Handlers for the `/password` resource (reset request, reset confirm).

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use janus_core::error::{AuthError, FieldError};
use janus_core::validation::validate_new_password;
use janus_db::models::session::CreateSession;
use janus_db::repositories::{SessionRepo, UserRepo};
use serde::Deserialize;

use crate::auth::password::hash_password;
use crate::codes::CodePurpose;
use crate::email::{password_reset_email, send_in_background};
use crate::error::{AppError, AppResult};
use crate::handlers::{build_auth_response, AuthResponse};
use crate::middleware::client::ClientMeta;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/password/reset`. At least one identifier
/// must be supplied.
#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Request body for `POST /v1/password/confirm`.
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub code: String,
    pub password: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/password/reset
///
/// Start a password reset. The response is 201 whether or not the
/// identifier matches an account, so the endpoint cannot be used to
/// enumerate users; a miss is only logged.
pub async fn reset(
    State(state): State<AppState>,
    Json(input): Json<ResetRequest>,
) -> AppResult<StatusCode> {
    let username = input.username.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let email = input.email.as_deref().map(str::trim).filter(|s| !s.is_empty());

    // 1. At least one identifier is required.
    if username.is_none() && email.is_none() {
        return Err(AuthError::ValidationFailed(vec![FieldError::new(
            "missing_identifier",
            "Either username or email must be supplied",
        )])
        .into());
    }

    // 2. Username lookup first, then email.
    let mut user = None;
    if let Some(username) = username {
        user = UserRepo::find_by_username(&state.pool, username).await?;
    }
    if user.is_none() {
        if let Some(email) = email {
            user = UserRepo::find_by_email(&state.pool, email).await?;
        }
    }

    // 3. On a hit, generate a code and queue the email; on a miss, do
    //    nothing observable.
    match user {
        Some(user) => {
            let code = state
                .codes
                .generate(user.uuid, CodePurpose::PasswordReset)
                .await
                .map_err(|e| AppError::InternalError(e.to_string()))?;
            let (subject, html) = password_reset_email(&code);
            send_in_background(Arc::clone(&state.mailer), user.email.clone(), subject, html);
        }
        None => {
            tracing::debug!("Password reset requested for an unknown identifier");
        }
    }

    Ok(StatusCode::CREATED)
}

/// POST /v1/password/confirm
///
/// Finish a password reset with a confirmation code and a new password.
/// Revokes every existing session for the user, opens a fresh one for the
/// requester, and returns a token pair bound to it.
pub async fn confirm(
    State(state): State<AppState>,
    client: ClientMeta,
    Json(input): Json<ConfirmRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    // 1. Atomic redemption: the code is destroyed here regardless of how
    //    the rest of the flow goes, so it can never be replayed.
    let redeemed = state
        .codes
        .redeem(&input.code)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    let (user_uuid, purpose) = redeemed.ok_or(AuthError::PasswordResetCodeInvalid)?;
    if purpose != CodePurpose::PasswordReset {
        return Err(AuthError::PasswordResetCodeInvalid.into());
    }

    // 2. The code's subject must still exist.
    let user = UserRepo::find_by_uuid(&state.pool, user_uuid)
        .await?
        .ok_or(AuthError::PasswordResetUserNotFound)?;

    // 3. Policy-check the new password against the account's identifiers.
    validate_new_password(
        &state.config.policy,
        &input.password,
        &user.username,
        &user.email,
    )?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    // 4. Hash update, directory propagation, session purge, and the new
    //    session commit together or not at all.
    let mut tx = state.pool.begin().await?;

    UserRepo::update_password(&mut *tx, user.uuid, &password_hash).await?;

    let mut updated_user = user.clone();
    updated_user.password_hash = password_hash;
    if let Err(e) = state.directory.update_remote_user(&updated_user).await {
        tracing::error!(
            username = %user.username,
            error = %e,
            "Password reset rolled back: directory update failed"
        );
        return Err(AuthError::PasswordResetException.into());
    }
    UserRepo::mark_synced(&mut *tx, user.uuid).await?;

    // 5. A reset password kills every active session, unconditionally --
    //    unlike logout, there is no session to spare.
    SessionRepo::delete_for_user(&mut *tx, user.uuid, &[]).await?;

    // 6. Fresh session for the requester.
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

    tracing::debug!(username = %user.username, "Password updated");
    let response = build_auth_response(&state.config.jwt, &updated_user, session.uuid)?;
    Ok((StatusCode::CREATED, Json(response)))
}
