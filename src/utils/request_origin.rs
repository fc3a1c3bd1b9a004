//! Absolute origin resolution for links shown to users.

use crate::AppError;
use axum::http::{HeaderMap, header};

/// Resolves the origin (`scheme://host[:port]`) short links are served from.
///
/// A configured `public_base_url` wins. Otherwise the origin is rebuilt from
/// the `Host` header, using `X-Forwarded-Proto` for the scheme when present
/// and `http` when not.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if no base URL is configured and the
/// `Host` header is missing or not valid UTF-8.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert(header::HOST, "s.example.com:8080".parse().unwrap());
///
/// assert_eq!(request_origin(&headers, None).unwrap(), "http://s.example.com:8080");
/// ```
pub fn request_origin(
    headers: &HeaderMap,
    public_base_url: Option<&str>,
) -> Result<String, AppError> {
    if let Some(base) = public_base_url {
        return Ok(base.trim_end_matches('/').to_string());
    }

    let host = headers
        .get(header::HOST)
        .ok_or_else(|| AppError::field("host", "Missing Host header"))?
        .to_str()
        .map_err(|_| AppError::field("host", "Invalid Host header"))?
        .trim();

    if host.is_empty() {
        return Err(AppError::field("host", "Missing Host header"));
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_ascii_lowercase())
        .filter(|v| v == "http" || v == "https")
        .unwrap_or_else(|| "http".to_string());

    Ok(format!("{scheme}://{host}"))
}

/// Joins an origin and an absolute path.
pub fn absolute_url(origin: &str, path: &str) -> String {
    format!("{}/{}", origin.trim_end_matches('/'), path.trim_start_matches('/'))
}
