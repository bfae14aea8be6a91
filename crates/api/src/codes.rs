//! Confirmation code store: short-lived, single-use codes backing email
//! activation and password reset.
//!
//! Codes are high-entropy hex strings kept in Redis under a TTL; the stored
//! value encodes `"<user_uuid>:<purpose>"`. Redemption is an atomic
//! `GETDEL`, so a code can never be redeemed twice even under concurrent
//! requests. A stored value that does not parse back is treated as
//! not-found, never as an error.

use async_trait::async_trait;
use rand::RngCore;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

/// What a confirmation code proves control of / unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodePurpose {
    /// Activates the email channel of a freshly registered account.
    EmailActivation,
    /// Authorizes a password reset.
    PasswordReset,
}

impl CodePurpose {
    /// Stable wire name used inside stored values.
    pub fn as_str(&self) -> &'static str {
        match self {
            CodePurpose::EmailActivation => "email",
            CodePurpose::PasswordReset => "password-reset",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "email" => Some(CodePurpose::EmailActivation),
            "password-reset" => Some(CodePurpose::PasswordReset),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("confirmation code store error: {0}")]
pub struct CodeStoreError(pub String);

/// Storage for one-time confirmation codes. A trait so tests can substitute
/// an in-memory implementation.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Create and persist a fresh code for the user/purpose pair.
    async fn generate(
        &self,
        user_uuid: Uuid,
        purpose: CodePurpose,
    ) -> Result<String, CodeStoreError>;

    /// Atomically look up and destroy a code. `None` for unknown, expired,
    /// or unparseable entries.
    async fn redeem(&self, code: &str) -> Result<Option<(Uuid, CodePurpose)>, CodeStoreError>;
}

/// Redis-backed [`CodeStore`].
#[derive(Clone)]
pub struct RedisCodeStore {
    manager: ConnectionManager,
    /// Generated code length in hex characters (so `length / 2` random bytes).
    code_length: usize,
    ttl_secs: u64,
}

impl RedisCodeStore {
    pub async fn new(
        redis_url: &str,
        code_length: usize,
        ttl_secs: u64,
    ) -> Result<Self, CodeStoreError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| CodeStoreError(format!("Redis connection failed: {e}")))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CodeStoreError(format!("Redis connection failed: {e}")))?;

        Ok(Self {
            manager,
            code_length,
            ttl_secs,
        })
    }
}

#[async_trait]
impl CodeStore for RedisCodeStore {
    async fn generate(
        &self,
        user_uuid: Uuid,
        purpose: CodePurpose,
    ) -> Result<String, CodeStoreError> {
        // length / 2 random bytes hex-encode to exactly `code_length` chars.
        let mut bytes = vec![0u8; self.code_length / 2];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let code = hex::encode(bytes);

        let mut conn = self.manager.clone();
        let _: () = conn
            .set_ex(
                &code,
                format!("{}:{}", user_uuid, purpose.as_str()),
                self.ttl_secs,
            )
            .await
            .map_err(|e| CodeStoreError(e.to_string()))?;

        tracing::info!(
            user_uuid = %user_uuid,
            purpose = purpose.as_str(),
            "Generated confirmation code"
        );
        Ok(code)
    }

    async fn redeem(&self, code: &str) -> Result<Option<(Uuid, CodePurpose)>, CodeStoreError> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = redis::cmd("GETDEL")
            .arg(code)
            .query_async(&mut conn)
            .await
            .map_err(|e| CodeStoreError(e.to_string()))?;

        Ok(raw.as_deref().and_then(parse_code_value))
    }
}

/// Parse a stored `"<user_uuid>:<purpose>"` value. Anything that does not
/// match the expected encoding is `None`.
fn parse_code_value(value: &str) -> Option<(Uuid, CodePurpose)> {
    let (user_part, purpose_part) = value.split_once(':')?;
    let user_uuid = Uuid::parse_str(user_part).ok()?;
    let purpose = CodePurpose::parse(purpose_part)?;
    Some((user_uuid, purpose))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_code_value_round_trip() {
        let user = Uuid::new_v4();
        let value = format!("{}:{}", user, CodePurpose::PasswordReset.as_str());
        let (parsed_user, purpose) = parse_code_value(&value).expect("value should parse");
        assert_eq!(parsed_user, user);
        assert_eq!(purpose, CodePurpose::PasswordReset);
    }

    #[test]
    fn test_parse_code_value_rejects_malformed() {
        // Malformed stored values are "not found", never a crash.
        assert!(parse_code_value("").is_none());
        assert!(parse_code_value("no-separator").is_none());
        assert!(parse_code_value("not-a-uuid:email").is_none());
        let user = Uuid::new_v4();
        assert!(parse_code_value(&format!("{user}:unknown-purpose")).is_none());
    }

    #[test]
    fn test_purpose_wire_names() {
        assert_eq!(CodePurpose::EmailActivation.as_str(), "email");
        assert_eq!(CodePurpose::PasswordReset.as_str(), "password-reset");
        assert_eq!(
            CodePurpose::parse("password-reset"),
            Some(CodePurpose::PasswordReset)
        );
    }
}
