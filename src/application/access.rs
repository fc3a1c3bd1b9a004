//! Owner checks for link operations.

use crate::domain::entities::ShortLink;
use crate::error::AppError;
use serde_json::json;

/// Fails with [`AppError::Forbidden`] unless `user_id` owns `link`.
pub fn ensure_owner(link: &ShortLink, user_id: i64) -> Result<(), AppError> {
    if link.owner_id == user_id {
        return Ok(());
    }

    tracing::debug!(link_id = link.id, user_id, "Rejected access to foreign link");
    Err(AppError::forbidden(
        "You do not have permission to access this link.",
        json!({ "link_id": link.id }),
    ))
}
