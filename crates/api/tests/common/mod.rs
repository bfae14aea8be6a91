//! Shared test plumbing: fake external collaborators, app construction,
//! and HTTP helpers.
//!
//! The fakes stand in for everything outside Postgres -- the Redis code
//! store, the user directory, and the email provider -- so integration
//! tests exercise the full handler/repository stack against a real
//! database with scriptable collaborator behavior.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use janus_api::auth::jwt::{Claims, JwtConfig, TokenKind};
use janus_api::codes::{CodePurpose, CodeStore, CodeStoreError};
use janus_api::config::ServerConfig;
use janus_api::directory::{DirectoryConfig, DirectoryError, UserDirectory};
use janus_api::email::{EmailConfig, EmailError, EmailSender};
use janus_api::routes;
use janus_api::state::AppState;
use janus_core::validation::Policy;
use janus_db::models::user::User;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// In-memory [`CodeStore`] with real TTL semantics and inspectable state.
#[derive(Default)]
pub struct InMemoryCodeStore {
    entries: Mutex<HashMap<String, (Uuid, CodePurpose, Option<Instant>)>>,
}

impl InMemoryCodeStore {
    /// Directly insert a known code (for driving the confirm flows).
    pub fn seed(&self, code: &str, user_uuid: Uuid, purpose: CodePurpose) {
        self.entries
            .lock()
            .unwrap()
            .insert(code.to_string(), (user_uuid, purpose, None));
    }

    /// Insert a code that is already past its TTL.
    pub fn seed_expired(&self, code: &str, user_uuid: Uuid, purpose: CodePurpose) {
        let past = Instant::now() - Duration::from_secs(1);
        self.entries
            .lock()
            .unwrap()
            .insert(code.to_string(), (user_uuid, purpose, Some(past)));
    }

    /// All live codes generated for a user.
    pub fn codes_for(&self, user_uuid: Uuid) -> Vec<(String, CodePurpose)> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, (uuid, _, _))| *uuid == user_uuid)
            .map(|(code, (_, purpose, _))| (code.clone(), *purpose))
            .collect()
    }
}

#[async_trait]
impl CodeStore for InMemoryCodeStore {
    async fn generate(
        &self,
        user_uuid: Uuid,
        purpose: CodePurpose,
    ) -> Result<String, CodeStoreError> {
        let code = Uuid::new_v4().simple().to_string();
        self.entries
            .lock()
            .unwrap()
            .insert(code.clone(), (user_uuid, purpose, None));
        Ok(code)
    }

    async fn redeem(&self, code: &str) -> Result<Option<(Uuid, CodePurpose)>, CodeStoreError> {
        // Removal happens before the expiry check: a code is single-use
        // whatever the outcome, matching the GETDEL semantics.
        let entry = self.entries.lock().unwrap().remove(code);
        Ok(entry.and_then(|(uuid, purpose, expires_at)| match expires_at {
            Some(deadline) if deadline <= Instant::now() => None,
            _ => Some((uuid, purpose)),
        }))
    }
}

/// Scriptable [`UserDirectory`]: tests flip the failure switches to
/// simulate a directory outage or rejection.
#[derive(Default)]
pub struct FakeDirectory {
    pub fail_create: AtomicBool,
    pub fail_update: AtomicBool,
    pub created: Mutex<Vec<String>>,
    pub updated: Mutex<Vec<String>>,
}

#[async_trait]
impl UserDirectory for FakeDirectory {
    async fn create_remote_user(&self, user: &User) -> Result<(), DirectoryError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(DirectoryError("scripted create failure".into()));
        }
        self.created.lock().unwrap().push(user.username.clone());
        Ok(())
    }

    async fn update_remote_user(&self, user: &User) -> Result<(), DirectoryError> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(DirectoryError("scripted update failure".into()));
        }
        self.updated.lock().unwrap().push(user.username.clone());
        Ok(())
    }
}

/// Recording [`EmailSender`] that always succeeds.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, _html: &str) -> Result<(), EmailError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Everything a test needs: the wired state plus handles on the fakes.
pub struct TestHarness {
    pub state: AppState,
    pub codes: Arc<InMemoryCodeStore>,
    pub directory: Arc<FakeDirectory>,
    pub mailer: Arc<RecordingMailer>,
}

/// Build a test `ServerConfig` with a fixed signing secret and default
/// policy. The directory/email sections are placeholders; fakes never
/// read them.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        redis_url: "redis://127.0.0.1:6379".to_string(),
        confirmation_code_length: 32,
        confirmation_code_ttl_secs: 900,
        policy: Policy::default(),
        jwt: test_jwt_config(),
        directory: DirectoryConfig {
            base_url: "http://directory.test".to_string(),
            token_header: "x-internal-token".to_string(),
            token: "test-token".to_string(),
        },
        email: EmailConfig {
            api_url: "http://email.test/emails".to_string(),
            api_key: "test-key".to_string(),
            from: "no-reply@janus.test".to_string(),
        },
    }
}

/// The JWT config used by the test app; tests craft their own tokens
/// against the same secret.
pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret-long-enough".to_string(),
        issuer: "JanusAuth".to_string(),
        audience: "JanusUsers".to_string(),
        access_token_lifetime_mins: 5,
        refresh_token_lifetime_days: 365,
    }
}

/// Wire a harness around the given database pool.
pub fn build_harness(pool: PgPool) -> TestHarness {
    let codes = Arc::new(InMemoryCodeStore::default());
    let directory = Arc::new(FakeDirectory::default());
    let mailer = Arc::new(RecordingMailer::default());

    let state = AppState {
        pool,
        config: Arc::new(test_config()),
        codes: Arc::clone(&codes) as Arc<dyn CodeStore>,
        directory: Arc::clone(&directory) as Arc<dyn UserDirectory>,
        mailer: Arc::clone(&mailer) as Arc<dyn EmailSender>,
    };

    TestHarness {
        state,
        codes,
        directory,
        mailer,
    }
}

impl TestHarness {
    /// Fresh router over the shared state. Handlers do not depend on the
    /// middleware stack, so tests exercise the bare routes.
    pub fn app(&self) -> Router {
        Router::new()
            .merge(routes::health::router())
            .nest("/v1", routes::api_routes())
            .with_state(self.state.clone())
    }

    /// Register a user via the API, asserting success, and return the
    /// response body (user fields + token pair).
    pub async fn register(&self, username: &str, email: &str, password: &str) -> serde_json::Value {
        let body = serde_json::json!({
            "username": username,
            "email": email,
            "password": password,
        });
        let response = post_json(self.app(), "/v1/user/register", body).await;
        assert_eq!(
            response.status(),
            axum::http::StatusCode::CREATED,
            "registration should succeed"
        );
        body_json(response).await
    }

    /// Log in via the API, asserting success, and return the response body.
    pub async fn login(&self, identifier: &str, password: &str) -> serde_json::Value {
        let body = serde_json::json!({ "username": identifier, "password": password });
        let response = post_json(self.app(), "/v1/user/login", body).await;
        assert_eq!(
            response.status(),
            axum::http::StatusCode::OK,
            "login should succeed"
        );
        body_json(response).await
    }
}

// ---------------------------------------------------------------------------
// Token crafting
// ---------------------------------------------------------------------------

/// Encode a token with fully explicit claims against the test secret, for
/// driving the failure paths the issue functions refuse to produce.
pub fn craft_token(kind: TokenKind, user_id: &str, jti: &str, exp_offset_secs: i64) -> String {
    let config = test_jwt_config();
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        exp: now + exp_offset_secs,
        nbf: now.min(now + exp_offset_secs),
        iat: now.min(now + exp_offset_secs),
        iss: config.issuer.clone(),
        aud: config.audience.clone(),
        jti: jti.to_string(),
        token_type: kind,
        user_id: user_id.to_string(),
        is_active: false,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .expect("encoding should succeed")
}

/// A token whose `exp` is safely past the decoder's leeway.
pub fn expired_token(kind: TokenKind, user_uuid: Uuid, session_uuid: Uuid) -> String {
    craft_token(
        kind,
        &user_uuid.to_string(),
        &session_uuid.to_string(),
        -600,
    )
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("GET")
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// GET with a raw `Authorization` header value (no `Bearer ` prefixing).
pub async fn get_raw_auth(app: Router, uri: &str, header: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("GET")
            .uri(uri)
            .header("authorization", header)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}

/// First `detail` entry's `type` field from an error response body.
pub fn error_type(body: &serde_json::Value) -> &str {
    body["detail"][0]["type"]
        .as_str()
        .expect("error body should carry detail[0].type")
}
