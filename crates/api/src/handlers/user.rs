//! Handlers for the `/user` resource (register, login).

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use janus_core::error::AuthError;
use janus_core::validation::validate_registration;
use janus_db::models::session::CreateSession;
use janus_db::models::user::CreateUser;
use janus_db::repositories::{SessionRepo, UserRepo};
use serde::Deserialize;

use crate::auth::password::{hash_password, verify_password};
use crate::codes::CodePurpose;
use crate::email::{activation_email, send_in_background};
use crate::error::{AppError, AppResult};
use crate::handlers::{build_auth_response, AuthResponse};
use crate::middleware::client::ClientMeta;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/user/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request body for `POST /v1/user/login`. The `username` field accepts
/// either a username or an email address.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/user/register
///
/// Create an account (inactive until email confirmation), announce it to
/// the external directory, open a session for the registering client, and
/// return the user with a fresh token pair.
pub async fn register(
    State(state): State<AppState>,
    client: ClientMeta,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    // 1. Policy validation; every violated rule is reported at once.
    validate_registration(
        &state.config.policy,
        &input.username,
        &input.email,
        &input.password,
    )?;
    let username = input.username.trim().to_string();
    let email = input.email.trim().to_string();

    // 2. Uniqueness checks, user + session inserts, and the directory sync
    //    share one transaction: either everything commits or nothing
    //    persists. Username is checked before email; when both conflict
    //    the username error wins.
    let mut tx = state.pool.begin().await?;

    if UserRepo::find_by_username(&mut *tx, &username)
        .await?
        .is_some()
    {
        return Err(AuthError::DuplicateUsername.into());
    }
    if UserRepo::find_by_email(&mut *tx, &email).await?.is_some() {
        return Err(AuthError::DuplicateEmail.into());
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &mut *tx,
        &CreateUser {
            username,
            email,
            password_hash,
        },
    )
    .await?;

    // 3. The auth store must never hold a user the directory does not know
    //    about: a failed sync (after the client's own retries) rolls back
    //    the whole registration.
    if let Err(e) = state.directory.create_remote_user(&user).await {
        tracing::error!(
            username = %user.username,
            error = %e,
            "Registration rolled back: directory sync failed"
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

    // 4. Activation code + email are post-commit side effects. A failed
    //    email never fails the registration; the user can be re-sent a
    //    code manually.
    let code = state
        .codes
        .generate(user.uuid, CodePurpose::EmailActivation)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    let (subject, html) = activation_email(&code);
    send_in_background(Arc::clone(&state.mailer), user.email.clone(), subject, html);

    let response = build_auth_response(&state.config.jwt, &user, session.uuid)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /v1/user/login
///
/// Authenticate with username-or-email + password. Opens a new session and
/// returns a token pair bound to it.
pub async fn login(
    State(state): State<AppState>,
    client: ClientMeta,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let identifier = input.username.trim();

    // 1. Find by username first, fall back to email.
    let user = match UserRepo::find_by_username(&state.pool, identifier).await? {
        Some(user) => Some(user),
        None => UserRepo::find_by_email(&state.pool, identifier).await?,
    };

    // Unknown user and wrong password produce the same error so the
    // response never reveals which field was wrong.
    let Some(user) = user else {
        return Err(AuthError::InvalidCredentials.into());
    };

    // 2. Verify the password.
    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        return Err(AuthError::InvalidCredentials.into());
    }

    // 3. One session per login; the refresh token's jti is the session id.
    let session = SessionRepo::create(
        &state.pool,
        &CreateSession {
            user_uuid: user.uuid,
            ip: client.ip,
            useragent: client.user_agent,
        },
    )
    .await?;

    let response = build_auth_response(&state.config.jwt, &user, session.uuid)?;
    Ok(Json(response))
}
