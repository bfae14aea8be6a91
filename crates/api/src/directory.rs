//! External user directory ("monolith") client.
//!
//! The auth store must never hold a user the directory does not know about,
//! so create/update calls run synchronously inside the calling flow's
//! transaction with a bounded retry loop. An HTTP 400 from the directory is
//! a permanent rejection and is never retried; transport errors and other
//! failure statuses are retried until the attempt/time budget runs out.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use janus_db::models::user::User;
use reqwest::Client;
use serde::Serialize;

/// Maximum attempts per sync call.
const MAX_ATTEMPTS: u32 = 5;
/// Total wall-clock budget per sync call. Callers apply a request-level
/// timeout above this.
const RETRY_BUDGET: Duration = Duration::from_secs(30);
/// Pause between attempts.
const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Connect timeout (TCP handshake + TLS).
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Per-request timeout (total request/response time).
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
#[error("directory sync failed: {0}")]
pub struct DirectoryError(pub String);

/// Propagates user identity to the external system of record. A trait so
/// tests can substitute a scriptable fake.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Announce a freshly registered user to the directory.
    async fn create_remote_user(&self, user: &User) -> Result<(), DirectoryError>;

    /// Propagate a credential/state change for an existing user.
    async fn update_remote_user(&self, user: &User) -> Result<(), DirectoryError>;
}

/// Directory endpoint configuration.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Base URL of the directory service, e.g. `http://monolith.internal`.
    pub base_url: String,
    /// Name of the internal-auth header the directory expects.
    pub token_header: String,
    /// Value of the internal-auth header.
    pub token: String,
}

impl DirectoryConfig {
    /// Load directory configuration from environment variables.
    ///
    /// | Env Var                  | Required |
    /// |--------------------------|----------|
    /// | `DIRECTORY_BASE_URL`     | **yes**  |
    /// | `DIRECTORY_TOKEN_HEADER` | **yes**  |
    /// | `DIRECTORY_TOKEN`        | **yes**  |
    ///
    /// # Panics
    ///
    /// Panics if any variable is missing.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("DIRECTORY_BASE_URL")
                .expect("DIRECTORY_BASE_URL must be set in the environment"),
            token_header: std::env::var("DIRECTORY_TOKEN_HEADER")
                .expect("DIRECTORY_TOKEN_HEADER must be set in the environment"),
            token: std::env::var("DIRECTORY_TOKEN")
                .expect("DIRECTORY_TOKEN must be set in the environment"),
        }
    }
}

/// Reqwest-backed [`UserDirectory`] implementation.
pub struct HttpDirectoryClient {
    client: Client,
    config: DirectoryConfig,
}

/// Creation payload sent to `POST {base_url}/v1/users/`.
#[derive(Serialize)]
struct RemoteUserCreate<'a> {
    external_user_uid: String,
    username: &'a str,
    email: &'a str,
}

/// Update payload sent to `POST {base_url}/v1/users/`. Carries the password
/// hash, never the plaintext.
#[derive(Serialize)]
struct RemoteUserUpdate<'a> {
    external_user_uid: String,
    password: &'a str,
}

/// One attempt's failure, split by whether retrying can help.
enum AttemptError {
    Permanent(String),
    Transient(String),
}

impl HttpDirectoryClient {
    /// Build a client with bounded connect/request timeouts.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be constructed (TLS
    /// misconfiguration); the service cannot run without it.
    pub fn new(config: DirectoryConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build directory HTTP client");
        Self { client, config }
    }

    fn users_url(&self) -> String {
        format!("{}/v1/users/", self.config.base_url.trim_end_matches('/'))
    }

    async fn post_once<T: Serialize>(&self, body: &T) -> Result<(), AttemptError> {
        let response = self
            .client
            .post(self.users_url())
            .header(self.config.token_header.as_str(), self.config.token.as_str())
            .json(body)
            .send()
            .await
            .map_err(|e| AttemptError::Transient(format!("transport error: {e}")))?;

        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            Ok(())
        } else if is_permanent_status(status) {
            Err(AttemptError::Permanent(format!(
                "directory rejected the request with HTTP {status}"
            )))
        } else {
            Err(AttemptError::Transient(format!("HTTP {status}")))
        }
    }

    async fn post_with_retry<T: Serialize>(
        &self,
        body: &T,
        operation: &'static str,
    ) -> Result<(), DirectoryError> {
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.post_once(body).await {
                Ok(()) => return Ok(()),
                Err(AttemptError::Permanent(msg)) => {
                    tracing::warn!(operation, attempt, error = %msg, "Directory rejected sync");
                    return Err(DirectoryError(msg));
                }
                Err(AttemptError::Transient(msg)) => {
                    let budget_spent = started.elapsed() + RETRY_BACKOFF >= RETRY_BUDGET;
                    if attempt >= MAX_ATTEMPTS || budget_spent {
                        tracing::warn!(
                            operation,
                            attempt,
                            error = %msg,
                            "Directory sync failed after retries"
                        );
                        return Err(DirectoryError(msg));
                    }
                    tracing::debug!(operation, attempt, error = %msg, "Retrying directory sync");
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
            }
        }
    }
}

#[async_trait]
impl UserDirectory for HttpDirectoryClient {
    async fn create_remote_user(&self, user: &User) -> Result<(), DirectoryError> {
        let body = RemoteUserCreate {
            external_user_uid: user.uuid.to_string(),
            username: &user.username,
            email: &user.email,
        };
        self.post_with_retry(&body, "create_remote_user").await
    }

    async fn update_remote_user(&self, user: &User) -> Result<(), DirectoryError> {
        let body = RemoteUserUpdate {
            external_user_uid: user.uuid.to_string(),
            password: &user.password_hash,
        };
        self.post_with_retry(&body, "update_remote_user").await
    }
}

/// True for statuses that indicate a permanent rejection. 4xx responses are
/// permanent except 408 Request Timeout, 409 Conflict, and 429 Too Many
/// Requests, which can succeed on retry.
fn is_permanent_status(status: u16) -> bool {
    if (400..500).contains(&status) {
        !matches!(status, 408 | 409 | 429)
    } else {
        false
    }
}
