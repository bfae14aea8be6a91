//! Service configuration.
//!
//! Read once at startup via [`ServerConfig::from_env`], then treated as
//! immutable: the instance lives behind an `Arc` inside `AppState` and is
//! passed to constructors explicitly.

use janus_core::validation::Policy;

use crate::auth::jwt::JwtConfig;
use crate::directory::DirectoryConfig;
use crate::email::EmailConfig;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `60`). Must exceed the
    /// directory client's retry budget so in-flight syncs are not cut off.
    pub request_timeout_secs: u64,
    /// Redis URL for the confirmation code store.
    pub redis_url: String,
    /// Generated confirmation code length in hex chars (default: `32`).
    pub confirmation_code_length: usize,
    /// Confirmation code TTL in seconds (default: `900`).
    pub confirmation_code_ttl_secs: u64,
    /// Username/password policy knobs.
    pub policy: Policy,
    /// Token configuration (secret, issuer/audience, lifetimes).
    pub jwt: JwtConfig,
    /// External user directory endpoint and credentials.
    pub directory: DirectoryConfig,
    /// Email provider endpoint and credentials.
    pub email: EmailConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                 |
    /// |--------------------------------|-------------------------|
    /// | `HOST`                         | `0.0.0.0`               |
    /// | `PORT`                         | `3000`                  |
    /// | `CORS_ORIGINS`                 | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`         | `60`                    |
    /// | `REDIS_URL`                    | `redis://127.0.0.1:6379`|
    /// | `CONFIRMATION_CODE_LENGTH`     | `32`                    |
    /// | `CONFIRMATION_CODE_TTL_SECS`   | `900`                   |
    /// | `USERNAME_MIN_LEN`             | `3`                     |
    /// | `USERNAME_MAX_LEN`             | `20`                    |
    /// | `PASSWORD_MIN_LEN`             | `8`                     |
    /// | `PASSWORD_SIMILARITY_MAX`      | `0.7`                   |
    ///
    /// See [`JwtConfig::from_env`], [`DirectoryConfig::from_env`], and
    /// [`EmailConfig::from_env`] for the nested sections.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());

        let confirmation_code_length: usize = std::env::var("CONFIRMATION_CODE_LENGTH")
            .unwrap_or_else(|_| "32".into())
            .parse()
            .expect("CONFIRMATION_CODE_LENGTH must be a valid usize");

        let confirmation_code_ttl_secs: u64 = std::env::var("CONFIRMATION_CODE_TTL_SECS")
            .unwrap_or_else(|_| "900".into())
            .parse()
            .expect("CONFIRMATION_CODE_TTL_SECS must be a valid u64");

        let policy = Policy {
            username_min_len: env_parse("USERNAME_MIN_LEN", 3),
            username_max_len: env_parse("USERNAME_MAX_LEN", 20),
            password_min_len: env_parse("PASSWORD_MIN_LEN", 8),
            password_similarity_max: env_parse("PASSWORD_SIMILARITY_MAX", 0.7),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            redis_url,
            confirmation_code_length,
            confirmation_code_ttl_secs,
            policy,
            jwt: JwtConfig::from_env(),
            directory: DirectoryConfig::from_env(),
            email: EmailConfig::from_env(),
        }
    }
}

/// Parse an env var with a default, panicking on an unparseable value.
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
