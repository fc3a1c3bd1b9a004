//! Classification of store conflicts.

use crate::error::AppError;

/// Unique constraint guarding `short_links.key`.
pub const SHORT_LINK_KEY_CONSTRAINT: &str = "short_links_key_key";

/// Unique constraint guarding `users.username`.
pub const USERNAME_CONSTRAINT: &str = "users_username_key";

/// Returns true if `e` is a uniqueness conflict on the short link key.
///
/// Conflicts without a constraint name (the in-memory store) count as key
/// conflicts when raised by the link repository.
pub fn is_key_conflict(e: &AppError) -> bool {
    match e {
        AppError::Conflict { .. } => matches!(
            e.conflict_constraint(),
            None | Some(SHORT_LINK_KEY_CONSTRAINT)
        ),
        _ => false,
    }
}
