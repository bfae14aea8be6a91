//! Outbound email dispatch.
//!
//! Email is best-effort everywhere it appears: flows queue the send on a
//! background task and report success to the caller regardless of the
//! outcome. Failures are logged so an operator can re-send a code manually.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

/// Connect timeout (TCP handshake + TLS).
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Per-request timeout (total request/response time).
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
#[error("email send failed: {0}")]
pub struct EmailError(pub String);

/// Delivers a single email. A trait so tests can substitute a recorder.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), EmailError>;
}

/// Email provider configuration.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Provider endpoint, e.g. `https://api.resend.com/emails`.
    pub api_url: String,
    /// Provider API key (sent as a bearer token).
    pub api_key: String,
    /// Sender address, e.g. `no-reply@janus.dev`.
    pub from: String,
}

impl EmailConfig {
    /// Load email configuration from environment variables.
    ///
    /// | Env Var         | Required | Default                          |
    /// |-----------------|----------|----------------------------------|
    /// | `EMAIL_API_URL` | no       | `https://api.resend.com/emails`  |
    /// | `EMAIL_API_KEY` | **yes**  | --                               |
    /// | `EMAIL_FROM`    | **yes**  | --                               |
    ///
    /// # Panics
    ///
    /// Panics if a required variable is missing.
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com/emails".into()),
            api_key: std::env::var("EMAIL_API_KEY")
                .expect("EMAIL_API_KEY must be set in the environment"),
            from: std::env::var("EMAIL_FROM").expect("EMAIL_FROM must be set in the environment"),
        }
    }
}

/// Reqwest-backed [`EmailSender`] posting JSON to the provider endpoint.
pub struct HttpEmailSender {
    client: Client,
    config: EmailConfig,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

impl HttpEmailSender {
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be constructed.
    pub fn new(config: EmailConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build email HTTP client");
        Self { client, config }
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), EmailError> {
        let body = SendRequest {
            from: &self.config.from,
            to: [to],
            subject,
            html,
        };
        self.client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError(e.to_string()))?
            .error_for_status()
            .map_err(|e| EmailError(e.to_string()))?;
        Ok(())
    }
}

/// Queue an email on a background task. The calling flow's outcome never
/// depends on delivery; failures are logged.
pub fn send_in_background(mailer: Arc<dyn EmailSender>, to: String, subject: String, html: String) {
    tokio::spawn(async move {
        if let Err(e) = mailer.send(&to, &subject, &html).await {
            tracing::warn!(error = %e, to = %to, "Failed to send email");
        }
    });
}

/// Subject and body for the account-activation email.
pub fn activation_email(code: &str) -> (String, String) {
    (
        "Confirm your account".to_string(),
        format!(
            "<p>Welcome! Use this code to confirm your email address:</p>\
             <p><strong>{code}</strong></p>\
             <p>The code expires shortly. If you did not register, ignore this email.</p>"
        ),
    )
}

/// Subject and body for the password-reset email.
pub fn password_reset_email(code: &str) -> (String, String) {
    (
        "Reset your password".to_string(),
        format!(
            "<p>Use this code to reset your password:</p>\
             <p><strong>{code}</strong></p>\
             <p>The code expires shortly. If you did not request a reset, ignore this email.</p>"
        ),
    )
}
