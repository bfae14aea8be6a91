//! Username and password policy validation.
//!
//! Rules are deliberately collected rather than short-circuited so a single
//! response can report every violation. All checks operate on trimmed input.

use validator::ValidateEmail;

use crate::error::{AuthError, FieldError};

/// Usernames that can never be registered regardless of charset/length.
const RESERVED_USERNAMES: &[&str] = &[
    "admin",
    "administrator",
    "moder",
    "moderator",
    "root",
    "support",
    "system",
];

/// Special characters accepted for the password complexity check.
const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*()-_=+[]{};:'\",.<>/?\\|`~";

/// Registration/reset policy knobs, loaded from the environment by the API
/// crate and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Policy {
    /// Minimum username length after trimming (default: 3).
    pub username_min_len: usize,
    /// Maximum username length after trimming (default: 20).
    pub username_max_len: usize,
    /// Minimum password length after trimming (default: 8).
    pub password_min_len: usize,
    /// Maximum allowed bigram similarity between the password and the
    /// username / email local part, in `0.0..=1.0` (default: 0.7).
    pub password_similarity_max: f64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            username_min_len: 3,
            username_max_len: 20,
            password_min_len: 8,
            password_similarity_max: 0.7,
        }
    }
}

/// Validate a username against the policy: trimmed length bounds, the
/// `[A-Za-z0-9_]` charset, and the reserved-name list.
pub fn validate_username(policy: &Policy, username: &str) -> Vec<FieldError> {
    let username = username.trim();
    let mut errors = Vec::new();

    if username.len() < policy.username_min_len || username.len() > policy.username_max_len {
        errors.push(FieldError::new(
            "invalid_username",
            format!(
                "Username must be between {} and {} characters long",
                policy.username_min_len, policy.username_max_len
            ),
        ));
        return errors;
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        errors.push(FieldError::new(
            "invalid_username",
            "Username may only contain letters, digits and underscores",
        ));
    }

    if RESERVED_USERNAMES.contains(&username.to_lowercase().as_str()) {
        errors.push(FieldError::new(
            "invalid_username",
            "This username is reserved",
        ));
    }

    errors
}

/// Validate email syntax.
pub fn validate_email(email: &str) -> Vec<FieldError> {
    if email.trim().validate_email() {
        Vec::new()
    } else {
        vec![FieldError::new("invalid_email", "Email address is invalid")]
    }
}

/// Validate a password against the policy.
///
/// Checks, in order: minimum length, lowercase letter, uppercase letter,
/// digit, special character, and similarity to the username and the email
/// local part. Every violated rule produces its own [`FieldError`].
pub fn validate_password(
    policy: &Policy,
    password: &str,
    username: &str,
    email: &str,
) -> Vec<FieldError> {
    let password = password.trim();
    let mut errors = Vec::new();

    if password.len() < policy.password_min_len {
        errors.push(FieldError::new(
            "short_password",
            format!(
                "Password must be at least {} characters long",
                policy.password_min_len
            ),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push(FieldError::new(
            "password_no_lowercase",
            "Password must contain at least one lowercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push(FieldError::new(
            "password_no_capital",
            "Password must contain at least one capital letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(FieldError::new(
            "password_no_digits",
            "Password must contain at least one digit",
        ));
    }
    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        errors.push(FieldError::new(
            "password_no_specialchars",
            "Password must contain at least one special character",
        ));
    }

    let email_local_part = email.split('@').next().unwrap_or(email);
    if is_too_similar(policy, password, username)
        || is_too_similar(policy, password, email_local_part)
    {
        errors.push(FieldError::new(
            "password_similar",
            "Password is too similar to the username or email",
        ));
    }

    errors
}

/// Validate the full registration payload, collecting username, email and
/// password violations into a single [`AuthError::ValidationFailed`].
pub fn validate_registration(
    policy: &Policy,
    username: &str,
    email: &str,
    password: &str,
) -> Result<(), AuthError> {
    let mut errors = validate_username(policy, username);
    errors.extend(validate_email(email));
    errors.extend(validate_password(policy, password, username, email));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AuthError::ValidationFailed(errors))
    }
}

/// Validate only a new password (password-reset confirm), against the
/// existing account's username and email.
pub fn validate_new_password(
    policy: &Policy,
    password: &str,
    username: &str,
    email: &str,
) -> Result<(), AuthError> {
    let errors = validate_password(policy, password, username, email);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AuthError::ValidationFailed(errors))
    }
}

/// True when `password` is too close to `reference` under the policy:
/// either one contains the other outright, or their character-bigram
/// Dice coefficient exceeds the configured maximum.
fn is_too_similar(policy: &Policy, password: &str, reference: &str) -> bool {
    let password = password.to_lowercase();
    let reference = reference.to_lowercase();

    if reference.len() >= 3 && (password.contains(&reference) || reference.contains(&password)) {
        return true;
    }

    bigram_dice(&password, &reference) > policy.password_similarity_max
}

/// Sørensen–Dice coefficient over character bigrams, in `0.0..=1.0`.
fn bigram_dice(a: &str, b: &str) -> f64 {
    let bigrams = |s: &str| -> Vec<(char, char)> {
        let chars: Vec<char> = s.chars().collect();
        chars.windows(2).map(|w| (w[0], w[1])).collect()
    };

    let mut a_grams = bigrams(a);
    let b_grams = bigrams(b);
    if a_grams.is_empty() || b_grams.is_empty() {
        return 0.0;
    }

    let total = a_grams.len() + b_grams.len();
    let mut matches = 0usize;
    for gram in &b_grams {
        if let Some(pos) = a_grams.iter().position(|g| g == gram) {
            a_grams.swap_remove(pos);
            matches += 1;
        }
    }

    (2 * matches) as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_type(errors: &[FieldError]) -> &'static str {
        errors.first().expect("expected at least one error").error_type
    }

    #[test]
    fn test_valid_username_passes() {
        let policy = Policy::default();
        assert!(validate_username(&policy, "testuser").is_empty());
        assert!(validate_username(&policy, "user_42").is_empty());
    }

    #[test]
    fn test_username_length_bounds() {
        let policy = Policy::default();
        // Surrounding whitespace is trimmed before the length check.
        assert_eq!(
            first_type(&validate_username(&policy, "   sh      ")),
            "invalid_username"
        );
        assert_eq!(
            first_type(&validate_username(&policy, "veryyyloooonguuusername")),
            "invalid_username"
        );
    }

    #[test]
    fn test_username_charset() {
        let policy = Policy::default();
        assert_eq!(
            first_type(&validate_username(&policy, "wrong!chars")),
            "invalid_username"
        );
    }

    #[test]
    fn test_reserved_usernames_rejected() {
        let policy = Policy::default();
        for name in [" admin ", "moder ", " moderator"] {
            assert!(
                !validate_username(&policy, name).is_empty(),
                "reserved username {name:?} must be rejected"
            );
        }
    }

    #[test]
    fn test_email_syntax() {
        assert!(validate_email("user@example.com").is_empty());
        assert_eq!(first_type(&validate_email("hello@")), "invalid_email");
        assert_eq!(first_type(&validate_email("@hello")), "invalid_email");
    }

    #[test]
    fn test_password_complexity_classes() {
        let policy = Policy::default();
        let cases = [
            ("     sh     ", "short_password"),
            ("passwordnocapital!12", "password_no_capital"),
            ("Passwordnospecial12", "password_no_specialchars"),
            ("Passwordnodigit!", "password_no_digits"),
            ("PASSWORDNOSMALL!12", "password_no_lowercase"),
        ];
        for (password, expected) in cases {
            let errors = validate_password(&policy, password, "testuser", "tst@example.com");
            assert!(
                errors.iter().any(|e| e.error_type == expected),
                "password {password:?} should produce {expected}, got {errors:?}"
            );
        }
    }

    #[test]
    fn test_password_similar_to_username() {
        let policy = Policy::default();
        let errors = validate_password(&policy, "Testuser1!", "testuser", "tst@example.com");
        assert!(
            errors.iter().any(|e| e.error_type == "password_similar"),
            "password embedding the username must be rejected, got {errors:?}"
        );
    }

    #[test]
    fn test_password_similar_to_email_local_part() {
        let policy = Policy::default();
        let errors =
            validate_password(&policy, "Mailbox77z!!", "someone", "mailbox77z@example.com");
        assert!(errors.iter().any(|e| e.error_type == "password_similar"));
    }

    #[test]
    fn test_strong_password_passes() {
        let policy = Policy::default();
        let errors = validate_password(&policy, "Str0ng&Unrelated", "testuser", "tst@example.com");
        assert!(errors.is_empty(), "expected no errors, got {errors:?}");
    }

    #[test]
    fn test_validate_registration_collects_all_violations() {
        let policy = Policy::default();
        let err = validate_registration(&policy, "sh", "not-an-email", "weak")
            .expect_err("invalid payload must fail");
        match err {
            AuthError::ValidationFailed(errors) => {
                assert!(errors.iter().any(|e| e.error_type == "invalid_username"));
                assert!(errors.iter().any(|e| e.error_type == "invalid_email"));
                assert!(errors.iter().any(|e| e.error_type == "short_password"));
            }
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_bigram_dice_bounds() {
        assert_eq!(bigram_dice("abc", "abc"), 1.0);
        assert_eq!(bigram_dice("abc", "xyz"), 0.0);
        assert_eq!(bigram_dice("", "abc"), 0.0);
    }
}
