//! Account form validation: email shape, password complexity, required fields.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use validator::ValidationError;

use crate::error::ClientError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

pub fn validate_email_format(email: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(email.trim()) {
        Ok(())
    } else {
        Err(error("email", "Enter a valid email address"))
    }
}

/// At least eight characters with one letter and one digit.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(error(
            "password_length",
            "Password must be at least 8 characters",
        ));
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err(error(
            "password_letter",
            "Password must contain at least one letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(error(
            "password_digit",
            "Password must contain at least one number",
        ));
    }
    Ok(())
}

pub fn validate_required(field: &str, value: &str) -> Result<(), ClientError> {
    if value.trim().is_empty() {
        return Err(ClientError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_format() {
        assert!(validate_email_format("creator@example.com").is_ok());
        assert!(validate_email_format(" creator@example.co.uk ").is_ok());
        assert!(validate_email_format("creator@example").is_err());
        assert!(validate_email_format("creator example@x.io").is_err());
        assert!(validate_email_format("").is_err());
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("clips4days").is_ok());
        assert_eq!(
            validate_password_strength("a1").unwrap_err().code,
            "password_length"
        );
        assert_eq!(
            validate_password_strength("12345678").unwrap_err().code,
            "password_letter"
        );
        assert_eq!(
            validate_password_strength("abcdefgh").unwrap_err().code,
            "password_digit"
        );
    }

    #[test]
    fn test_required() {
        assert!(validate_required("Email", "x").is_ok());
        let err = validate_required("Email", "   ").unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Email is required");
    }
}
