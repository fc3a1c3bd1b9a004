//! Short link entity mapping an alias to its destination.

use chrono::{DateTime, Utc};

/// A short alias owned by a user and redirecting to `original_url`.
///
/// `key` is unique across all links and never empty once stored. `clicks`
/// only moves through the redirect path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortLink {
    pub id: i64,
    pub owner_id: i64,
    pub original_url: String,
    pub key: String,
    pub clicks: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ShortLink {
    /// Returns true once `expires_at` is at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| e <= now)
    }

    /// Returns true if the link has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Public path of the redirect endpoint for this link.
    pub fn short_path(&self) -> String {
        format!("/s/{}", self.key)
    }
}

/// Row to insert for a new link.
///
/// `id` is reserved from the store's sequence beforehand so the key can be
/// derived from it and written in the same insert.
#[derive(Debug, Clone)]
pub struct NewShortLink {
    pub id: i64,
    pub owner_id: i64,
    pub original_url: String,
    pub key: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Owner edit of an existing link. Every field is written.
#[derive(Debug, Clone)]
pub struct ShortLinkPatch {
    pub original_url: String,
    pub key: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn link(expires_at: Option<DateTime<Utc>>) -> ShortLink {
        let now = Utc::now();
        ShortLink {
            id: 1,
            owner_id: 7,
            original_url: "https://example.com/".to_string(),
            key: "1".to_string(),
            clicks: 0,
            created_at: now,
            updated_at: now,
            expires_at,
        }
    }

    #[test]
    fn test_link_without_expiry_never_expires() {
        assert!(!link(None).is_expired());
    }

    #[test]
    fn test_link_expired_in_the_past() {
        assert!(link(Some(Utc::now() - Duration::seconds(1))).is_expired());
    }

    #[test]
    fn test_link_expires_exactly_at_deadline() {
        let deadline = Utc::now();
        let link = link(Some(deadline));

        assert!(link.is_expired_at(deadline));
        assert!(!link.is_expired_at(deadline - Duration::milliseconds(1)));
    }

    #[test]
    fn test_short_path() {
        let mut link = link(None);
        link.key = "aZ3".to_string();
        assert_eq!(link.short_path(), "/s/aZ3");
    }
}
