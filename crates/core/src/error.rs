//! Domain error taxonomy.
//!
//! Every flow failure maps onto one [`AuthError`] kind. Each kind carries a
//! stable machine-readable discriminator ([`AuthError::error_type`]) that the
//! HTTP boundary serializes as the `type` field of error response entries,
//! so clients and tests can branch on it without parsing messages.

/// A single field-level validation failure.
///
/// Collected into [`AuthError::ValidationFailed`] so that one response can
/// report every violated rule at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Stable discriminator, e.g. `"short_password"` or `"invalid_username"`.
    pub error_type: &'static str,
    /// Human-readable explanation.
    pub msg: String,
}

impl FieldError {
    pub fn new(error_type: &'static str, msg: impl Into<String>) -> Self {
        Self {
            error_type,
            msg: msg.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Login failed. Deliberately identical for unknown-user and
    /// wrong-password so the response never reveals which field was wrong.
    #[error("Invalid username/email or password")]
    InvalidCredentials,

    /// No bearer credential was supplied at all (distinct from a bad one).
    #[error("No authentication credentials supplied")]
    Forbidden,

    /// The token's signature, structure, or a required claim is invalid.
    #[error("Token is invalid")]
    TokenMalformed,

    /// The token's `exp` claim has passed.
    #[error("Token has expired")]
    TokenExpired,

    /// An access token was used where a refresh token is required, or
    /// vice versa.
    #[error("Wrong token type used for this operation")]
    WrongTokenType,

    /// The refresh token's `jti` does not resolve to a live session.
    #[error("No session matches the supplied refresh token")]
    SessionNotFound,

    /// The token's subject does not resolve to a live user.
    #[error("User not found")]
    UserNotFound,

    #[error("A user with this username is already registered")]
    DuplicateUsername,

    #[error("A user with this email is already registered")]
    DuplicateEmail,

    /// The external user directory rejected the sync or stayed unreachable
    /// past the retry budget.
    #[error("Could not synchronize the user with the directory")]
    DirectorySyncFailed,

    /// An email-activation code was unknown, expired, or bound to the
    /// wrong purpose.
    #[error("Confirmation code is invalid or expired")]
    ConfirmationCodeInvalid,

    /// A password-reset code was unknown, expired, or bound to the
    /// wrong purpose.
    #[error("Password reset code is invalid or expired")]
    PasswordResetCodeInvalid,

    /// The user referenced by a password-reset code no longer exists.
    #[error("No user is bound to this password reset code")]
    PasswordResetUserNotFound,

    /// The password update could not be completed. Details are logged
    /// server-side only.
    #[error("Could not update the password")]
    PasswordResetException,

    /// One or more field-level policy violations.
    #[error("Validation failed")]
    ValidationFailed(Vec<FieldError>),

    /// A requested resource does not exist or is not owned by the caller.
    /// Used for session deletion so the response never reveals whether the
    /// session exists under another user.
    #[error("Not found")]
    NotFound,
}

impl AuthError {
    /// Stable machine-readable discriminator for this error kind.
    ///
    /// `ValidationFailed` responses use the per-field types from the
    /// contained [`FieldError`]s instead.
    pub fn error_type(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Forbidden => "forbidden",
            AuthError::TokenMalformed => "token_invalid",
            AuthError::TokenExpired => "token_expired",
            AuthError::WrongTokenType => "wrong_token_type",
            AuthError::SessionNotFound => "session_not_found",
            AuthError::UserNotFound => "user_not_found",
            AuthError::DuplicateUsername => "duplicate_username",
            AuthError::DuplicateEmail => "duplicate_email",
            AuthError::DirectorySyncFailed => "directory_sync_failed",
            AuthError::ConfirmationCodeInvalid => "confirmation_code_invalid",
            AuthError::PasswordResetCodeInvalid => "password_reset_code_invalid",
            AuthError::PasswordResetUserNotFound => "password_reset_user_not_found",
            AuthError::PasswordResetException => "password_reset_failed",
            AuthError::ValidationFailed(_) => "validation_failed",
            AuthError::NotFound => "not_found",
        }
    }
}
