//! Session cookie reading and writing.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::COOKIE, request::Parts},
};
use chrono::Utc;
use std::convert::Infallible;

use crate::domain::entities::CurrentUser;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session_id";

/// Extracts the session token from the `Cookie` header.
///
/// Handles multiple cookies by splitting on semicolons and ignoring the
/// others.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookie_str| cookie_str.split(';'))
        .find_map(|cookie| {
            let mut parts = cookie.trim().splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some(SESSION_COOKIE), Some(value)) if !value.is_empty() => Some(value.to_string()),
                _ => None,
            }
        })
}

/// `Set-Cookie` value opening a session.
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value removing the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

/// Only paths on this site are accepted as post-login targets.
///
/// Browsers strip tabs and newlines while parsing a `Location`, so a path
/// carrying control characters can collapse into `//host`.
pub fn safe_next(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(path) if is_local_path(path) => path.to_string(),
        _ => "/".to_string(),
    }
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.contains('\\')
        && !path.chars().any(char::is_control)
}

/// The signed-in user, if any, for pages that work both ways.
///
/// Never rejects: a missing, stale or unreadable session is `None`.
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub fn username(&self) -> Option<String> {
        self.0.as_ref().map(|u| u.username.clone())
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(Self(Some(user.clone())));
        }

        let Some(token) = session_token(&parts.headers) else {
            return Ok(Self(None));
        };

        match state.auth_service.authenticate(&token, Utc::now()).await {
            Ok(user) => Ok(Self(user)),
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed");
                Ok(Self(None))
            }
        }
    }
}
