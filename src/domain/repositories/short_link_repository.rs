//! Repository trait for short link data access.

use crate::domain::entities::{NewShortLink, ShortLink, ShortLinkPatch};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for short links.
///
/// The store owns two guarantees the application relies on: the unique
/// constraint on `key` and the atomic `clicks` increment.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgShortLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::InMemoryStore`] - process-local store
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShortLinkRepository: Send + Sync {
    /// Reserves the next identifier from the link sequence.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn next_id(&self) -> Result<i64, AppError>;

    /// Inserts a link under a previously reserved identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if `key` is already taken.
    /// Returns [`AppError::Internal`] on database errors.
    async fn insert(&self, new_link: NewShortLink) -> Result<ShortLink, AppError>;

    /// Checks whether `key` is in use, optionally ignoring one link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn key_exists(&self, key: &str, exclude_id: Option<i64>) -> Result<bool, AppError>;

    /// Finds a link by identifier.
    async fn find_by_id(&self, id: i64) -> Result<Option<ShortLink>, AppError>;

    /// Finds a link by exact key.
    async fn find_by_key(&self, key: &str) -> Result<Option<ShortLink>, AppError>;

    /// Lists the links of one owner, newest first.
    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<ShortLink>, AppError>;

    /// Lists every link with its owner's username, newest first.
    ///
    /// `search` matches key, URL and username case-insensitively.
    async fn list_all(&self, search: Option<String>) -> Result<Vec<(ShortLink, String)>, AppError>;

    /// Applies an owner edit and refreshes `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link no longer exists.
    /// Returns [`AppError::Conflict`] if the new key is already taken.
    async fn update(
        &self,
        id: i64,
        patch: ShortLinkPatch,
        now: DateTime<Utc>,
    ) -> Result<ShortLink, AppError>;

    /// Replaces only the key and refreshes `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link no longer exists.
    /// Returns [`AppError::Conflict`] if the key is already taken.
    async fn update_key(&self, id: i64, key: &str, now: DateTime<Utc>) -> Result<ShortLink, AppError>;

    /// Deletes a link. Returns `Ok(false)` if it did not exist.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Adds one to `clicks` as a single store-level operation.
    ///
    /// Returns `Ok(false)` if the link vanished in the meantime.
    async fn increment_clicks(&self, id: i64) -> Result<bool, AppError>;

    /// Round-trips to the store for health reporting.
    async fn ping(&self) -> Result<(), AppError>;
}
