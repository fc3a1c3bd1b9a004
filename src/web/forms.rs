//! Form payloads posted by the HTML pages.

use serde::Deserialize;

use crate::application::services::ShortLinkInput;
use crate::application::services::short_link_service::EXPIRES_FIELD;
use crate::domain::entities::ShortLink;
use crate::error::AppError;
use crate::utils::datetime::{format_datetime_local, parse_datetime_local};

/// Create/edit form for a short link. All fields arrive as raw strings so a
/// rejected submission can be echoed back unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShortLinkForm {
    pub original_url: String,
    pub custom_key: String,
    pub expires_at: String,
}

impl ShortLinkForm {
    /// Pre-fills the edit form from a stored link.
    pub fn from_link(link: &ShortLink) -> Self {
        Self {
            original_url: link.original_url.clone(),
            custom_key: link.key.clone(),
            expires_at: link
                .expires_at
                .as_ref()
                .map(format_datetime_local)
                .unwrap_or_default(),
        }
    }

    /// # Errors
    ///
    /// Returns [`AppError::Validation`] on `expires_at` when the date cannot be read.
    pub fn to_input(&self) -> Result<ShortLinkInput, AppError> {
        let expires_at = parse_datetime_local(&self.expires_at)
            .map_err(|_| AppError::field(EXPIRES_FIELD, "Enter a valid date/time."))?;

        Ok(ShortLinkInput {
            original_url: self.original_url.clone(),
            custom_key: Some(self.custom_key.clone()).filter(|k| !k.trim().is_empty()),
            expires_at,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

/// `?next=` on the login page.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_blank_fields_become_none() {
        let input = ShortLinkForm {
            original_url: "https://example.com".to_string(),
            custom_key: "   ".to_string(),
            expires_at: String::new(),
        }
        .to_input()
        .unwrap();

        assert_eq!(input.custom_key, None);
        assert_eq!(input.expires_at, None);
    }

    #[test]
    fn test_expiry_parsed() {
        let input = ShortLinkForm {
            original_url: "https://example.com".to_string(),
            custom_key: "promo".to_string(),
            expires_at: "2031-01-02T03:04".to_string(),
        }
        .to_input()
        .unwrap();

        assert_eq!(input.custom_key.as_deref(), Some("promo"));
        assert_eq!(
            input.expires_at,
            Some(Utc.with_ymd_and_hms(2031, 1, 2, 3, 4, 0).unwrap())
        );
    }

    #[test]
    fn test_bad_expiry_is_field_error() {
        let err = ShortLinkForm {
            expires_at: "soon".to_string(),
            ..Default::default()
        }
        .to_input()
        .unwrap_err();

        match err {
            AppError::Validation { fields, .. } => assert!(fields.contains(EXPIRES_FIELD)),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
