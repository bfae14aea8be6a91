//! HTTP-level integration tests for login.

mod common;

use axum::http::StatusCode;
use common::{body_json, error_type, post_json};
use janus_db::repositories::{SessionRepo, UserRepo};
use sqlx::PgPool;

fn login_body(identifier: &str, password: &str) -> serde_json::Value {
    serde_json::json!({ "username": identifier, "password": password })
}

/// Successful login returns a token pair and opens a second session
/// alongside the registration one.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_success(pool: PgPool) {
    let harness = common::build_harness(pool.clone());
    harness.register("alice", "a@example.com", "Str0ng!Pw").await;

    let response = post_json(
        harness.app(),
        "/v1/user/login",
        login_body("alice", "Str0ng!Pw"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["username"], "alice");

    let user = UserRepo::find_by_username(&pool, "alice")
        .await
        .unwrap()
        .unwrap();
    let sessions = SessionRepo::list_by_user(&pool, user.uuid).await.unwrap();
    assert_eq!(sessions.len(), 2, "register + login = two sessions");
}

/// The identifier field also accepts the account's email address.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_with_email_identifier(pool: PgPool) {
    let harness = common::build_harness(pool);
    harness.register("alice", "a@example.com", "Str0ng!Pw").await;

    let response = post_json(
        harness.app(),
        "/v1/user/login",
        login_body("a@example.com", "Str0ng!Pw"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

/// A wrong password yields the generic credentials error and no session.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_wrong_password(pool: PgPool) {
    let harness = common::build_harness(pool.clone());
    harness.register("alice", "a@example.com", "Str0ng!Pw").await;

    let response = post_json(
        harness.app(),
        "/v1/user/login",
        login_body("alice", "wrong-password"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(error_type(&json), "invalid_credentials");

    let user = UserRepo::find_by_username(&pool, "alice")
        .await
        .unwrap()
        .unwrap();
    let sessions = SessionRepo::list_by_user(&pool, user.uuid).await.unwrap();
    assert_eq!(sessions.len(), 1, "failed login must not create a session");
}

/// An unknown identifier yields a response indistinguishable from the
/// wrong-password case.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_unknown_user_matches_wrong_password(pool: PgPool) {
    let harness = common::build_harness(pool);
    harness.register("alice", "a@example.com", "Str0ng!Pw").await;

    let unknown = post_json(
        harness.app(),
        "/v1/user/login",
        login_body("ghost", "whatever"),
    )
    .await;
    let wrong = post_json(
        harness.app(),
        "/v1/user/login",
        login_body("alice", "whatever"),
    )
    .await;

    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let unknown_body = body_json(unknown).await;
    let wrong_body = body_json(wrong).await;
    assert_eq!(
        unknown_body, wrong_body,
        "the response must not reveal which field was wrong"
    );
}

/// An inactive (not yet confirmed) account can still log in; the access
/// token just carries is_active = false.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_inactive_user_allowed(pool: PgPool) {
    let harness = common::build_harness(pool);
    harness.register("alice", "a@example.com", "Str0ng!Pw").await;

    let json = harness.login("alice", "Str0ng!Pw").await;
    assert_eq!(json["is_active"], false);
}
