//! Repository for the `users` table.
//!
//! All lookups exclude soft-deleted rows; deletion is always the soft kind.

use janus_core::types::DbId;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::user::{CreateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "uuid, username, email, password_hash, is_active, \
                        email_confirmed_at, synced_at, created_at, updated_at, deleted_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user (inactive until confirmed), returning the created row.
    pub async fn create(
        exec: impl PgExecutor<'_>,
        input: &CreateUser,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (uuid, username, email, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.password_hash)
            .fetch_one(exec)
            .await
    }

    /// Find a live user by internal id.
    pub async fn find_by_uuid(
        exec: impl PgExecutor<'_>,
        uuid: DbId,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE uuid = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, User>(&query)
            .bind(uuid)
            .fetch_optional(exec)
            .await
    }

    /// Find a live user by username (case-sensitive).
    pub async fn find_by_username(
        exec: impl PgExecutor<'_>,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM users WHERE username = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(exec)
            .await
    }

    /// Find a live user by email (case-sensitive).
    pub async fn find_by_email(
        exec: impl PgExecutor<'_>,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(exec)
            .await
    }

    /// Replace the user's password hash. Returns `true` if the row was updated.
    pub async fn update_password(
        exec: impl PgExecutor<'_>,
        uuid: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW()
             WHERE uuid = $1 AND deleted_at IS NULL",
        )
        .bind(uuid)
        .bind(password_hash)
        .execute(exec)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stamp the email channel as confirmed. Returns `true` if the row was
    /// updated (i.e. the channel was not already confirmed).
    pub async fn confirm_email(
        exec: impl PgExecutor<'_>,
        uuid: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET email_confirmed_at = NOW(), updated_at = NOW()
             WHERE uuid = $1 AND email_confirmed_at IS NULL AND deleted_at IS NULL",
        )
        .bind(uuid)
        .execute(exec)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flip the account to active. Returns `true` if the row was updated.
    pub async fn activate(exec: impl PgExecutor<'_>, uuid: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET is_active = true, updated_at = NOW()
             WHERE uuid = $1 AND is_active = false AND deleted_at IS NULL",
        )
        .bind(uuid)
        .execute(exec)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a successful directory sync.
    pub async fn mark_synced(exec: impl PgExecutor<'_>, uuid: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET synced_at = NOW(), updated_at = NOW() WHERE uuid = $1")
            .bind(uuid)
            .execute(exec)
            .await?;
        Ok(())
    }

    /// Soft-delete a user. Returns `true` if the row was updated; the second
    /// call for the same user returns `false`.
    pub async fn soft_delete(exec: impl PgExecutor<'_>, uuid: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = NOW(), updated_at = NOW()
             WHERE uuid = $1 AND deleted_at IS NULL",
        )
        .bind(uuid)
        .execute(exec)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
