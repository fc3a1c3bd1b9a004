//! Public key resolution for `/s/{key}`.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;

use crate::domain::repositories::ShortLinkRepository;
use crate::error::AppError;

/// Why a key could not be resolved.
///
/// `NotFound` and `Expired` are reported to visitors identically; the split
/// exists for logging and tests.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no link for key")]
    NotFound,

    #[error("link expired")]
    Expired,

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<ResolveError> for AppError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::NotFound | ResolveError::Expired => {
                AppError::not_found("Short link not found", json!({}))
            }
            ResolveError::Store(e) => e,
        }
    }
}

pub struct RedirectService<R: ShortLinkRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: ShortLinkRepository + ?Sized> RedirectService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Resolves `key` to its destination and counts the visit.
    ///
    /// Expired links are not counted. The count is bumped by the store in a
    /// single statement, so concurrent visits are never lost.
    pub async fn resolve(&self, key: &str, now: DateTime<Utc>) -> Result<String, ResolveError> {
        let link = self
            .repository
            .find_by_key(key)
            .await?
            .ok_or(ResolveError::NotFound)?;

        if link.is_expired_at(now) {
            tracing::debug!(link_id = link.id, %key, "Expired link requested");
            return Err(ResolveError::Expired);
        }

        if !self.repository.increment_clicks(link.id).await? {
            // Deleted between lookup and increment.
            return Err(ResolveError::NotFound);
        }

        Ok(link.original_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ShortLink;
    use crate::domain::repositories::MockShortLinkRepository;
    use chrono::Duration;

    fn link(expires_at: Option<DateTime<Utc>>) -> ShortLink {
        let now = Utc::now();
        ShortLink {
            id: 11,
            owner_id: 1,
            original_url: "https://example.com/target".to_string(),
            key: "b".to_string(),
            clicks: 3,
            created_at: now,
            updated_at: now,
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_resolve_counts_visit() {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_find_by_key()
            .withf(|key| key == "b")
            .returning(|_| Ok(Some(link(None))));
        repo.expect_increment_clicks()
            .withf(|id| *id == 11)
            .times(1)
            .returning(|_| Ok(true));

        let url = RedirectService::new(Arc::new(repo))
            .resolve("b", Utc::now())
            .await
            .unwrap();

        assert_eq!(url, "https://example.com/target");
    }

    #[tokio::test]
    async fn test_resolve_unknown_key() {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_find_by_key().returning(|_| Ok(None));
        repo.expect_increment_clicks().times(0);

        let result = RedirectService::new(Arc::new(repo))
            .resolve("nope", Utc::now())
            .await;

        assert!(matches!(result, Err(ResolveError::NotFound)));
    }

    #[tokio::test]
    async fn test_resolve_expired_leaves_clicks() {
        let now = Utc::now();
        let mut repo = MockShortLinkRepository::new();
        repo.expect_find_by_key()
            .returning(move |_| Ok(Some(link(Some(now)))));
        repo.expect_increment_clicks().times(0);

        let result = RedirectService::new(Arc::new(repo)).resolve("b", now).await;

        assert!(matches!(result, Err(ResolveError::Expired)));
    }

    #[tokio::test]
    async fn test_resolve_future_expiry_redirects() {
        let now = Utc::now();
        let mut repo = MockShortLinkRepository::new();
        repo.expect_find_by_key()
            .returning(move |_| Ok(Some(link(Some(now + Duration::seconds(1))))));
        repo.expect_increment_clicks().returning(|_| Ok(true));

        let result = RedirectService::new(Arc::new(repo)).resolve("b", now).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_store_error_propagates() {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_find_by_key()
            .returning(|_| Err(AppError::internal("db down", json!({}))));

        let result = RedirectService::new(Arc::new(repo))
            .resolve("b", Utc::now())
            .await;

        assert!(matches!(result, Err(ResolveError::Store(AppError::Internal { .. }))));
    }

    #[test]
    fn test_expired_is_public_not_found() {
        let err: AppError = ResolveError::Expired.into();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
