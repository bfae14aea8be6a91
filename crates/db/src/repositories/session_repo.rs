//! Repository for the `user_sessions` table.
//!
//! Deletion operations are scoped by the owning user id so one user can
//! never revoke another user's session by guessing an id.

use janus_core::types::DbId;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::session::{CreateSession, UserSession};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "uuid, user_uuid, ip, useragent, last_activity, created_at";

/// Provides CRUD operations for user sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row. The generated
    /// `uuid` becomes the refresh token's `jti`.
    pub async fn create(
        exec: impl PgExecutor<'_>,
        input: &CreateSession,
    ) -> Result<UserSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_sessions (uuid, user_uuid, ip, useragent)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(Uuid::new_v4())
            .bind(input.user_uuid)
            .bind(&input.ip)
            .bind(&input.useragent)
            .fetch_one(exec)
            .await
    }

    /// Find a session by id.
    pub async fn find_by_uuid(
        exec: impl PgExecutor<'_>,
        uuid: DbId,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_sessions WHERE uuid = $1");
        sqlx::query_as::<_, UserSession>(&query)
            .bind(uuid)
            .fetch_optional(exec)
            .await
    }

    /// List all sessions for a user, most recently active first.
    pub async fn list_by_user(
        exec: impl PgExecutor<'_>,
        user_uuid: DbId,
    ) -> Result<Vec<UserSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_sessions
             WHERE user_uuid = $1
             ORDER BY last_activity DESC"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(user_uuid)
            .fetch_all(exec)
            .await
    }

    /// Update activity metadata; called on every token refresh. `None`
    /// values leave the previous ip/useragent in place.
    pub async fn touch(
        exec: impl PgExecutor<'_>,
        uuid: DbId,
        ip: Option<&str>,
        useragent: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE user_sessions SET
                ip = COALESCE($2, ip),
                useragent = COALESCE($3, useragent),
                last_activity = NOW()
             WHERE uuid = $1",
        )
        .bind(uuid)
        .bind(ip)
        .bind(useragent)
        .execute(exec)
        .await?;
        Ok(())
    }

    /// Delete one session iff it belongs to the given user. Returns whether
    /// a row was removed.
    pub async fn delete_one(
        exec: impl PgExecutor<'_>,
        user_uuid: DbId,
        session_uuid: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM user_sessions WHERE uuid = $1 AND user_uuid = $2")
                .bind(session_uuid)
                .bind(user_uuid)
                .execute(exec)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Bulk-revoke all of a user's sessions except the listed ones (pass
    /// an empty slice to revoke unconditionally). Returns the number of
    /// rows removed.
    pub async fn delete_for_user(
        exec: impl PgExecutor<'_>,
        user_uuid: DbId,
        exclude: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM user_sessions WHERE user_uuid = $1 AND uuid <> ALL($2)",
        )
        .bind(user_uuid)
        .bind(exclude)
        .execute(exec)
        .await?;
        Ok(result.rows_affected())
    }
}
