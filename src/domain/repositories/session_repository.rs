//! Repository trait for login sessions.

use crate::domain::entities::Session;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for server-side sessions.
///
/// Sessions are looked up by the HMAC-SHA256 hash of the cookie token; raw
/// tokens are never persisted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Stores a new session.
    async fn create(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, AppError>;

    /// Finds a session that is still active at `now`.
    async fn find_active(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, AppError>;

    /// Deletes a session. Missing sessions are not an error.
    async fn delete(&self, token_hash: &str) -> Result<(), AppError>;

    /// Removes the expired sessions of one user and returns how many went.
    async fn purge_expired(&self, user_id: i64, now: DateTime<Utc>) -> Result<u64, AppError>;
}
