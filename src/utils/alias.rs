//! Rules for user-supplied aliases.

use crate::error::AppError;

/// Longest key the store accepts.
pub const MAX_KEY_LEN: usize = 32;

/// Form field the alias is submitted under.
pub const ALIAS_FIELD: &str = "custom_key";

/// Validates a user-provided alias.
///
/// # Rules
///
/// - Length: 1-32 characters
/// - Allowed characters: ASCII letters and digits
///
/// # Errors
///
/// Returns [`AppError::Validation`] on the `custom_key` field if any rule is
/// violated.
///
/// # Examples
///
/// ```ignore
/// assert!(validate_custom_alias("Promo2025").is_ok());
/// assert!(validate_custom_alias("my-link").is_err());
/// ```
pub fn validate_custom_alias(alias: &str) -> Result<(), AppError> {
    if alias.is_empty() || alias.len() > MAX_KEY_LEN {
        return Err(AppError::field(
            ALIAS_FIELD,
            format!("Custom alias must be 1-{MAX_KEY_LEN} characters"),
        ));
    }

    if !alias.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::field(
            ALIAS_FIELD,
            "Custom alias must be alphanumeric",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_message(result: Result<(), AppError>) -> String {
        match result {
            Err(AppError::Validation { fields, .. }) => {
                fields.first(ALIAS_FIELD).unwrap_or_default().to_string()
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_mixed_case_and_digits() {
        assert!(validate_custom_alias("Promo2025").is_ok());
    }

    #[test]
    fn test_validate_single_character() {
        assert!(validate_custom_alias("a").is_ok());
    }

    #[test]
    fn test_validate_maximum_length() {
        assert!(validate_custom_alias(&"a".repeat(MAX_KEY_LEN)).is_ok());
    }

    #[test]
    fn test_validate_too_long() {
        let message = field_message(validate_custom_alias(&"a".repeat(MAX_KEY_LEN + 1)));
        assert!(message.contains("1-32"));
    }

    #[test]
    fn test_validate_empty_string() {
        assert!(validate_custom_alias("").is_err());
    }

    #[test]
    fn test_validate_hyphen_rejected() {
        let message = field_message(validate_custom_alias("my-link"));
        assert!(message.contains("alphanumeric"));
    }

    #[test]
    fn test_validate_spaces_not_allowed() {
        assert!(validate_custom_alias("my link").is_err());
    }

    #[test]
    fn test_validate_non_ascii_letters_rejected() {
        assert!(validate_custom_alias("café").is_err());
    }
}
