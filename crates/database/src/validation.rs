//! Input validation for account and profile fields.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid email format.
    InvalidEmail(String),
    /// Password does not meet the policy.
    WeakPassword(String),
    /// Value too long.
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },
    /// Empty value where one is required.
    Empty(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            ValidationError::WeakPassword(msg) => write!(f, "Invalid password: {}", msg),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Password length bounds. The upper bound keeps hashes within the argon2
/// input limit used at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 72;

/// Maximum allowed length for display names.
pub const MAX_DISPLAY_NAME_LENGTH: usize = 120;

/// Validate an email address (basic RFC 5322 format check).
///
/// This is a basic validation that checks:
/// - Contains exactly one @
/// - Has at least one character before @
/// - Has at least one character after @
/// - Has at least one dot after @
/// - Is not too long
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Empty("email".to_string()));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LENGTH,
            actual: email.len(),
        });
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ValidationError::InvalidEmail(
            "must contain exactly one @ symbol".to_string(),
        ));
    }

    let (local, domain) = (parts[0], parts[1]);

    if local.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing local part (before @)".to_string(),
        ));
    }

    if domain.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing domain (after @)".to_string(),
        ));
    }

    if !domain.contains('.') {
        return Err(ValidationError::InvalidEmail(
            "domain must contain at least one dot".to_string(),
        ));
    }

    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(ValidationError::InvalidEmail(
            "domain cannot start or end with a dot".to_string(),
        ));
    }

    if domain.contains("..") {
        return Err(ValidationError::InvalidEmail(
            "domain cannot contain consecutive dots".to_string(),
        ));
    }

    Ok(())
}

/// Validate a registration password.
///
/// The policy asks for 8 to 72 characters with at least one uppercase
/// letter, one digit and one non-alphanumeric character.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::Empty("password".to_string()));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::WeakPassword(format!(
            "must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: MAX_PASSWORD_LENGTH,
            actual: password.chars().count(),
        });
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::WeakPassword(
            "must contain an uppercase letter".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::WeakPassword(
            "must contain a digit".to_string(),
        ));
    }

    if !password.chars().any(|c| !c.is_alphanumeric()) {
        return Err(ValidationError::WeakPassword(
            "must contain a special character".to_string(),
        ));
    }

    Ok(())
}

/// Validate a display name.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Empty("displayName".to_string()));
    }

    if name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "displayName".to_string(),
            max: MAX_DISPLAY_NAME_LENGTH,
            actual: name.chars().count(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name@domain.co.uk").is_ok());
        assert!(validate_email("a@b.c").is_ok());
        assert!(validate_email(" test@example.com ").is_ok()); // trimmed
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(matches!(validate_email(""), Err(ValidationError::Empty(_))));
        assert!(matches!(
            validate_email("test.example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@example@com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("@example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@localhost"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@example..com"),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_validate_email_too_long() {
        let long_local = "a".repeat(250);
        let email = format!("{}@example.com", long_local);
        assert!(email.len() > 254);
        assert!(matches!(
            validate_email(&email),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validate_password_policy() {
        assert!(validate_password("Password1!").is_ok());
        assert!(validate_password("Abcdef1$").is_ok());

        assert!(matches!(
            validate_password(""),
            Err(ValidationError::Empty(_))
        ));
        assert!(matches!(
            validate_password("Ab1!"),
            Err(ValidationError::WeakPassword(_))
        ));
        assert!(matches!(
            validate_password("password1!"),
            Err(ValidationError::WeakPassword(_))
        ));
        assert!(matches!(
            validate_password("Password!!"),
            Err(ValidationError::WeakPassword(_))
        ));
        assert!(matches!(
            validate_password("Password11"),
            Err(ValidationError::WeakPassword(_))
        ));
        let long = format!("Aa1!{}", "x".repeat(80));
        assert!(matches!(
            validate_password(&long),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validate_display_name() {
        assert!(validate_display_name("Famille Demo").is_ok());
        assert!(matches!(
            validate_display_name("   "),
            Err(ValidationError::Empty(_))
        ));
        let long = "x".repeat(200);
        assert!(matches!(
            validate_display_name(&long),
            Err(ValidationError::TooLong { .. })
        ));
    }
}
