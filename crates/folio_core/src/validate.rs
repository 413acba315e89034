//! Input validation for user-supplied fields.

use thiserror::Error;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Validation failure for a user-supplied field.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Email is empty or not shaped like an address
    #[error("Invalid email address")]
    InvalidEmail,
    /// Password is shorter than [`MIN_PASSWORD_LEN`]
    #[error("Password must be at least {MIN_PASSWORD_LEN} characters long")]
    PasswordTooShort,
    /// Document title is missing or blank
    #[error("Document title is required")]
    EmptyTitle,
}

/// Check that `email` is shaped like an address.
///
/// Shape check only; the mail transport is the real arbiter.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if !email.contains('@') || email.len() < 5 {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

/// Check that `password` meets the minimum length.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Check that `title` is non-blank.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("  alice@example.com  ").is_ok());
        assert_eq!(validate_email("no-at-sign"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("a@b"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email(""), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret").is_ok());
        assert_eq!(
            validate_password("short"),
            Err(ValidationError::PasswordTooShort)
        );
        assert_eq!(validate_password(""), Err(ValidationError::PasswordTooShort));
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Meeting notes").is_ok());
        assert_eq!(validate_title(""), Err(ValidationError::EmptyTitle));
        assert_eq!(validate_title("   "), Err(ValidationError::EmptyTitle));
    }
}
