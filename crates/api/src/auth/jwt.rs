//! Token codec: issuing and validating access and refresh tokens.
//!
//! Both token kinds are HS256-signed JWTs sharing one claim set. The
//! `token_type` claim is the explicit discriminator -- callers that require
//! one kind must check it themselves and fail with the wrong-token-type
//! error. A refresh token's `jti` equals a session row's uuid, which is
//! what makes refresh tokens revocable server-side; access tokens also
//! carry their issuing session's uuid as `jti` so session endpoints can
//! identify the caller's own session, but access validity never consults
//! the session table.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token type discriminator carried as an explicit claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claim set embedded in every token.
///
/// Server-generated time claims always satisfy `iat <= nbf <= exp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Not-before time (UTC Unix timestamp).
    pub nbf: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Fixed issuer constant.
    pub iss: String,
    /// Fixed audience constant.
    pub aud: String,
    /// Unique token identifier; a session uuid for both token kinds.
    pub jti: String,
    /// Explicit access/refresh discriminator.
    pub token_type: TokenKind,
    /// Subject user uuid.
    pub user_id: String,
    /// Snapshot of the user's active flag. Meaningful on access tokens;
    /// refresh tokens always carry `false`.
    #[serde(default)]
    pub is_active: bool,
}

/// Configuration for token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Long-lived HMAC-SHA256 signing secret.
    pub secret: String,
    /// Issuer constant baked into and required from every token.
    pub issuer: String,
    /// Audience constant baked into and required from every token.
    pub audience: String,
    /// Access token lifetime in minutes (default: 5).
    pub access_token_lifetime_mins: i64,
    /// Refresh token lifetime in days (default: 365).
    pub refresh_token_lifetime_days: i64,
}

/// Default access token lifetime in minutes.
const DEFAULT_ACCESS_LIFETIME_MINS: i64 = 5;
/// Default refresh token lifetime in days.
const DEFAULT_REFRESH_LIFETIME_DAYS: i64 = 365;

impl JwtConfig {
    /// Load token configuration from environment variables.
    ///
    /// | Env Var                     | Required | Default      |
    /// |-----------------------------|----------|--------------|
    /// | `JWT_SECRET`                | **yes**  | --           |
    /// | `JWT_ISSUER`                | no       | `JanusAuth`  |
    /// | `JWT_AUDIENCE`              | no       | `JanusUsers` |
    /// | `JWT_ACCESS_LIFETIME_MINS`  | no       | `5`          |
    /// | `JWT_REFRESH_LIFETIME_DAYS` | no       | `365`        |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let issuer = std::env::var("JWT_ISSUER").unwrap_or_else(|_| "JanusAuth".into());
        let audience = std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "JanusUsers".into());

        let access_token_lifetime_mins: i64 = std::env::var("JWT_ACCESS_LIFETIME_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_LIFETIME_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_LIFETIME_MINS must be a valid i64");

        let refresh_token_lifetime_days: i64 = std::env::var("JWT_REFRESH_LIFETIME_DAYS")
            .unwrap_or_else(|_| DEFAULT_REFRESH_LIFETIME_DAYS.to_string())
            .parse()
            .expect("JWT_REFRESH_LIFETIME_DAYS must be a valid i64");

        Self {
            secret,
            issuer,
            audience,
            access_token_lifetime_mins,
            refresh_token_lifetime_days,
        }
    }
}

/// Why a token failed to decode. The two kinds map to different HTTP
/// statuses, so they must stay distinguishable.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    /// The `exp` claim has passed.
    #[error("token has expired")]
    Expired,
    /// Bad signature, bad structure, wrong issuer/audience, or a missing
    /// required claim.
    #[error("token is malformed")]
    Malformed,
}

/// Generate an access token for the given user, bound to the issuing
/// session via `jti` and snapshotting the user's active flag.
pub fn issue_access_token(
    config: &JwtConfig,
    user_uuid: Uuid,
    is_active: bool,
    session_uuid: Uuid,
) -> Result<String, jsonwebtoken::errors::Error> {
    issue(
        config,
        TokenKind::Access,
        user_uuid,
        session_uuid,
        is_active,
        config.access_token_lifetime_mins * 60,
    )
}

/// Generate a refresh token whose `jti` is the backing session's uuid.
pub fn issue_refresh_token(
    config: &JwtConfig,
    user_uuid: Uuid,
    session_uuid: Uuid,
) -> Result<String, jsonwebtoken::errors::Error> {
    issue(
        config,
        TokenKind::Refresh,
        user_uuid,
        session_uuid,
        false,
        config.refresh_token_lifetime_days * 24 * 3600,
    )
}

fn issue(
    config: &JwtConfig,
    kind: TokenKind,
    user_uuid: Uuid,
    jti: Uuid,
    is_active: bool,
    lifetime_secs: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        exp: now + lifetime_secs,
        nbf: now,
        iat: now,
        iss: config.issuer.clone(),
        aud: config.audience.clone(),
        jti: jti.to_string(),
        token_type: kind,
        user_id: user_uuid.to_string(),
        is_active,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate and decode a token, returning the embedded [`Claims`].
///
/// Verifies the signature, expiry, not-before, issuer, and audience. Only
/// an elapsed `exp` yields [`TokenError::Expired`]; every other problem
/// (including a missing required claim) is [`TokenError::Malformed`].
pub fn decode_token(config: &JwtConfig, token: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_audience(&[&config.audience]);
    validation.set_required_spec_claims(&["exp", "iss", "aud"]);
    validation.validate_nbf = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    })
}
