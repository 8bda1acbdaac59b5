//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

use crate::errors::{IdentityError, IdentityResult};

/// Reject any field that is empty after trimming
pub fn require_non_empty(value: &str, field: &str) -> IdentityResult<()> {
    if value.trim().is_empty() {
        return Err(IdentityError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Validate username: 3-32 chars, letters, numbers, and underscores
pub fn validate_username(username: &str) -> IdentityResult<()> {
    require_non_empty(username, "username")?;

    if username.len() < 3 || username.len() > 32 {
        return Err(IdentityError::Validation(
            "username must be between 3 and 32 characters long".to_string(),
        ));
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err(IdentityError::Validation(
            "username can only contain letters, numbers, and underscores".to_string(),
        ));
    }

    Ok(())
}

/// Validate email format
pub fn validate_email(email: &str) -> IdentityResult<()> {
    require_non_empty(email, "email")?;

    if email.len() > 254 {
        return Err(IdentityError::Validation(
            "email must be at most 254 characters long".to_string(),
        ));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err(IdentityError::Validation("invalid email format".to_string()));
    }

    Ok(())
}

/// Validate password length bounds
pub fn validate_password(password: &str) -> IdentityResult<()> {
    require_non_empty(password, "password")?;

    if password.len() < 8 {
        return Err(IdentityError::Validation(
            "password must be at least 8 characters long".to_string(),
        ));
    }

    if password.len() > 128 {
        return Err(IdentityError::Validation(
            "password must be at most 128 characters long".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_non_empty_rejects_whitespace() {
        assert!(require_non_empty("  ", "full_name").is_err());
        assert!(require_non_empty("", "full_name").is_err());
        assert!(require_non_empty("ok", "full_name").is_ok());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("chai_aur_code").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("one@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"p".repeat(129)).is_err());
    }
}
