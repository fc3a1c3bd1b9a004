//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use chrono::Utc;
use tracing::debug;

use crate::application::services::ResolveError;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short key to its original URL and counts the visit.
///
/// # Endpoint
///
/// `GET /s/{key}`
///
/// # Errors
///
/// Returns 404 Not Found if the key is unknown or the link has expired.
pub async fn redirect_handler(
    Path(key): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    match state.redirect_service.resolve(&key, Utc::now()).await {
        Ok(url) => Ok(Redirect::temporary(&url)),
        Err(e @ (ResolveError::NotFound | ResolveError::Expired)) => {
            debug!(%key, reason = %e, "Redirect refused");
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
