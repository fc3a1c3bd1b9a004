//! Destination URL validation and normalization.

use crate::error::AppError;
use url::Url;

/// Form field the destination URL is submitted under.
pub const URL_FIELD: &str = "original_url";

/// Upper bound on stored destination URLs.
pub const MAX_URL_LEN: usize = 2048;

/// Errors that can occur while normalizing a destination URL.
#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("Enter a valid URL.")]
    InvalidFormat(String),

    #[error("Only http and https URLs can be shortened.")]
    UnsupportedProtocol,

    #[error("The URL must include a host.")]
    MissingHost,

    #[error("URLs longer than {MAX_URL_LEN} characters are not supported.")]
    TooLong,
}

impl From<UrlNormalizationError> for AppError {
    fn from(e: UrlNormalizationError) -> Self {
        AppError::field(URL_FIELD, e.to_string())
    }
}

/// Normalizes a destination URL to a canonical absolute form.
///
/// Only `http` and `https` are accepted. The host is lower-cased, the default
/// port and any fragment are dropped; path and query are kept as given.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(
///     normalize_url("HTTPS://EXAMPLE.COM:443/Path#top").unwrap(),
///     "https://example.com/Path"
/// );
/// ```
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let input = input.trim();
    if input.len() > MAX_URL_LEN {
        return Err(UrlNormalizationError::TooLong);
    }

    let mut url =
        Url::parse(input).map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlNormalizationError::UnsupportedProtocol);
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlNormalizationError::MissingHost);
    }

    // `Url` already lower-cases domain hosts and strips default ports.
    url.set_fragment(None);

    let normalized = url.to_string();
    if normalized.len() > MAX_URL_LEN {
        return Err(UrlNormalizationError::TooLong);
    }

    Ok(normalized)
}
