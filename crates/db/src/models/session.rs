//! User session model and DTOs.
//!
//! A session row backs exactly one refresh token: the row's `uuid` is the
//! token's `jti` claim, and deleting the row revokes the token regardless
//! of its signature lifetime.

use janus_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A session row from the `user_sessions` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserSession {
    pub uuid: DbId,
    pub user_uuid: DbId,
    pub ip: Option<String>,
    pub useragent: Option<String>,
    pub last_activity: Timestamp,
    pub created_at: Timestamp,
}

/// Session representation for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub uuid: DbId,
    pub ip: Option<String>,
    pub useragent: Option<String>,
    pub last_activity: Timestamp,
    pub created_at: Timestamp,
}

impl From<&UserSession> for SessionResponse {
    fn from(session: &UserSession) -> Self {
        Self {
            uuid: session.uuid,
            ip: session.ip.clone(),
            useragent: session.useragent.clone(),
            last_activity: session.last_activity,
            created_at: session.created_at,
        }
    }
}

/// DTO for creating a new session.
#[derive(Debug)]
pub struct CreateSession {
    pub user_uuid: DbId,
    pub ip: Option<String>,
    pub useragent: Option<String>,
}
