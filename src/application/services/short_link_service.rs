//! Owner-facing short link management.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use std::sync::Arc;

use crate::application::access::ensure_owner;
use crate::application::services::key_generator::{KeyGenerator, UNIQUE_KEY_FAILED, alias_taken};
use crate::domain::entities::{NewShortLink, ShortLink, ShortLinkPatch};
use crate::domain::repositories::ShortLinkRepository;
use crate::error::{AppError, FORM_FIELD, FieldErrors};
use crate::utils::db_error::is_key_conflict;
use crate::utils::url_normalizer::{URL_FIELD, normalize_url};

/// Form field carrying the optional expiry.
pub const EXPIRES_FIELD: &str = "expires_at";

/// Attempts at inserting a default-keyed link when a concurrent writer takes the key.
const DEFAULT_KEY_ATTEMPTS: usize = 3;

/// Values submitted on the create and edit forms.
#[derive(Debug, Clone, Default)]
pub struct ShortLinkInput {
    pub original_url: String,
    /// Blank means "derive one" on create and "keep the current key" on edit.
    pub custom_key: Option<String>,
    /// Blank means "apply the default expiry".
    pub expires_at: Option<DateTime<Utc>>,
}

impl ShortLinkInput {
    fn alias(&self) -> Option<&str> {
        self.custom_key
            .as_deref()
            .map(str::trim)
            .filter(|alias| !alias.is_empty())
    }
}

/// Create, edit, delete and regenerate operations on an owner's links.
pub struct ShortLinkService<R: ShortLinkRepository + ?Sized> {
    repository: Arc<R>,
    keys: KeyGenerator<R>,
    default_expiry: Option<Duration>,
}

impl<R: ShortLinkRepository + ?Sized> ShortLinkService<R> {
    /// `default_expiry` of `None` leaves blank expiries unset.
    pub fn new(repository: Arc<R>, keys: KeyGenerator<R>, default_expiry: Option<Duration>) -> Self {
        Self {
            repository,
            keys,
            default_expiry,
        }
    }

    /// Creates a link for `owner_id`.
    ///
    /// All form problems are collected before anything is written. With no
    /// alias the key is derived from a reserved identifier so the row is
    /// inserted once with its final key.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for a bad URL, a malformed or taken alias,
    ///   or an expiry in the past
    /// - [`AppError::Internal`] on store errors
    pub async fn create(
        &self,
        owner_id: i64,
        input: ShortLinkInput,
        now: DateTime<Utc>,
    ) -> Result<ShortLink, AppError> {
        let mut errors = FieldErrors::new();

        let original_url = collect(&mut errors, normalize_url(&input.original_url).map_err(Into::into))?;

        let alias = input.alias().map(str::to_string);
        if let Some(alias) = &alias {
            collect(&mut errors, self.keys.ensure_alias_available(alias, None).await)?;
        }

        let expires_at = collect(&mut errors, self.resolve_expiry(input.expires_at, now))?;

        if !errors.is_empty() {
            tracing::debug!(owner_id, ?errors, "Short link rejected");
            return Err(AppError::invalid("Please correct the errors below.", errors));
        }
        let (Some(original_url), Some(expires_at)) = (original_url, expires_at) else {
            return Err(AppError::internal("Validated input went missing", json!({})));
        };

        let id = self.repository.next_id().await?;

        let link = match alias {
            Some(key) => self
                .repository
                .insert(NewShortLink {
                    id,
                    owner_id,
                    original_url,
                    key,
                    expires_at,
                })
                .await
                .map_err(|e| if is_key_conflict(&e) { alias_taken() } else { e })?,
            None => {
                self.insert_with_default_key(id, owner_id, original_url, expires_at)
                    .await?
            }
        };

        tracing::info!(link_id = link.id, key = %link.key, owner_id, "Short link created");

        Ok(link)
    }

    async fn insert_with_default_key(
        &self,
        id: i64,
        owner_id: i64,
        original_url: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ShortLink, AppError> {
        let mut attempt = 1;
        loop {
            let key = self.keys.derive_default_key(id).await?;
            let result = self
                .repository
                .insert(NewShortLink {
                    id,
                    owner_id,
                    original_url: original_url.clone(),
                    key: key.clone(),
                    expires_at,
                })
                .await;

            match result {
                Err(e) if is_key_conflict(&e) && attempt < DEFAULT_KEY_ATTEMPTS => {
                    tracing::debug!(id, %key, attempt, "Default key taken concurrently, retrying");
                    attempt += 1;
                }
                Err(e) if is_key_conflict(&e) => {
                    tracing::warn!(id, %key, attempt, "Default key still taken, giving up");
                    return Err(AppError::field(FORM_FIELD, UNIQUE_KEY_FAILED));
                }
                other => return other,
            }
        }
    }

    /// Links owned by `owner_id`, newest first.
    pub async fn list(&self, owner_id: i64) -> Result<Vec<ShortLink>, AppError> {
        self.repository.list_by_owner(owner_id).await
    }

    /// Every link with its owner's username, for administration.
    pub async fn list_all(&self, search: Option<String>) -> Result<Vec<(ShortLink, String)>, AppError> {
        self.repository.list_all(search).await
    }

    /// Loads link `id` on behalf of `user_id`.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if the link does not exist
    /// - [`AppError::Forbidden`] if `user_id` is not the owner
    pub async fn get_owned(&self, id: i64, user_id: i64) -> Result<ShortLink, AppError> {
        let link = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "id": id })))?;

        ensure_owner(&link, user_id)?;

        Ok(link)
    }

    /// Applies an owner edit.
    ///
    /// A blank alias keeps the current key; an alias equal to the link's own
    /// key is accepted. A blank expiry is reset to the default.
    pub async fn edit(
        &self,
        id: i64,
        user_id: i64,
        input: ShortLinkInput,
        now: DateTime<Utc>,
    ) -> Result<ShortLink, AppError> {
        let link = self.get_owned(id, user_id).await?;
        let mut errors = FieldErrors::new();

        let original_url = collect(&mut errors, normalize_url(&input.original_url).map_err(Into::into))?;

        let key = match input.alias() {
            Some(alias) if alias != link.key => {
                collect(&mut errors, self.keys.ensure_alias_available(alias, Some(id)).await)?;
                alias.to_string()
            }
            _ => link.key.clone(),
        };

        let expires_at = collect(&mut errors, self.resolve_expiry(input.expires_at, now))?;

        if !errors.is_empty() {
            tracing::debug!(link_id = id, ?errors, "Short link edit rejected");
            return Err(AppError::invalid("Please correct the errors below.", errors));
        }
        let (Some(original_url), Some(expires_at)) = (original_url, expires_at) else {
            return Err(AppError::internal("Validated input went missing", json!({})));
        };

        let updated = self
            .repository
            .update(
                id,
                ShortLinkPatch {
                    original_url,
                    key,
                    expires_at,
                },
                now,
            )
            .await
            .map_err(|e| if is_key_conflict(&e) { alias_taken() } else { e })?;

        tracing::info!(link_id = id, key = %updated.key, user_id, "Short link updated");

        Ok(updated)
    }

    /// Deletes an owned link.
    pub async fn delete(&self, id: i64, user_id: i64) -> Result<(), AppError> {
        self.get_owned(id, user_id).await?;

        if !self.repository.delete(id).await? {
            return Err(AppError::not_found("Short link not found", json!({ "id": id })));
        }

        tracing::info!(link_id = id, user_id, "Short link deleted");

        Ok(())
    }

    /// Replaces the key of an owned link with a freshly generated one.
    pub async fn regenerate(
        &self,
        id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<ShortLink, AppError> {
        let link = self.get_owned(id, user_id).await?;

        let key = self.keys.regenerate(id, now).await?;
        let updated = self
            .repository
            .update_key(id, &key, now)
            .await
            .map_err(|e| {
                if is_key_conflict(&e) {
                    AppError::field("key", UNIQUE_KEY_FAILED)
                } else {
                    e
                }
            })?;

        tracing::info!(link_id = id, old_key = %link.key, key = %updated.key, "Short link key regenerated");

        Ok(updated)
    }

    fn resolve_expiry(
        &self,
        requested: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, AppError> {
        match requested {
            Some(at) if at <= now => Err(AppError::field(
                EXPIRES_FIELD,
                "Expiry date must be in the future.",
            )),
            Some(at) => Ok(Some(at)),
            None => match self.default_expiry {
                Some(ttl) => now.checked_add_signed(ttl).map(Some).ok_or_else(|| {
                    AppError::internal(
                        "Default expiry is out of range",
                        json!({ "default_expiry_secs": ttl.num_seconds() }),
                    )
                }),
                None => Ok(None),
            },
        }
    }
}

/// Moves a validation failure into `errors`; other errors are returned.
fn collect<T>(errors: &mut FieldErrors, result: Result<T, AppError>) -> Result<Option<T>, AppError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(AppError::Validation { fields, .. }) => {
            errors.merge(fields);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::key_generator::{ALIAS_TAKEN_MESSAGE, DEFAULT_SUFFIX_LEN};
    use crate::domain::repositories::MockShortLinkRepository;
    use crate::utils::alias::ALIAS_FIELD;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn service(repo: MockShortLinkRepository) -> ShortLinkService<MockShortLinkRepository> {
        let repo = Arc::new(repo);
        let keys = KeyGenerator::with_rng(repo.clone(), DEFAULT_SUFFIX_LEN, StdRng::seed_from_u64(1));
        ShortLinkService::new(repo, keys, Some(Duration::days(30)))
    }

    fn stored(new_link: NewShortLink) -> ShortLink {
        let now = Utc::now();
        ShortLink {
            id: new_link.id,
            owner_id: new_link.owner_id,
            original_url: new_link.original_url,
            key: new_link.key,
            clicks: 0,
            created_at: now,
            updated_at: now,
            expires_at: new_link.expires_at,
        }
    }

    fn existing(id: i64, owner_id: i64, key: &str) -> ShortLink {
        stored(NewShortLink {
            id,
            owner_id,
            original_url: "https://example.com/".to_string(),
            key: key.to_string(),
            expires_at: None,
        })
    }

    fn input(url: &str, alias: Option<&str>) -> ShortLinkInput {
        ShortLinkInput {
            original_url: url.to_string(),
            custom_key: alias.map(str::to_string),
            expires_at: None,
        }
    }

    fn fields(err: AppError) -> FieldErrors {
        match err {
            AppError::Validation { fields, .. } => fields,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_derives_key_from_reserved_id() {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_next_id().times(1).returning(|| Ok(125));
        repo.expect_key_exists().returning(|_, _| Ok(false));
        repo.expect_insert()
            .withf(|l| l.id == 125 && l.key == "21" && l.owner_id == 9)
            .times(1)
            .returning(|l| Ok(stored(l)));

        let now = Utc::now();
        let link = service(repo)
            .create(9, input("https://Example.com/a#frag", None), now)
            .await
            .unwrap();

        assert_eq!(link.key, "21");
        assert_eq!(link.original_url, "https://example.com/a");
        assert_eq!(link.expires_at, Some(now + Duration::days(30)));
    }

    #[tokio::test]
    async fn test_create_with_taken_alias_persists_nothing() {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_key_exists().returning(|_, _| Ok(true));
        repo.expect_next_id().times(0);
        repo.expect_insert().times(0);

        let err = service(repo)
            .create(1, input("https://example.com", Some("promo")), Utc::now())
            .await
            .unwrap_err();

        assert_eq!(fields(err).first(ALIAS_FIELD), Some(ALIAS_TAKEN_MESSAGE));
    }

    #[tokio::test]
    async fn test_create_collects_all_field_errors() {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_key_exists().returning(|_, _| Ok(true));
        repo.expect_insert().times(0);

        let now = Utc::now();
        let mut bad = input("ftp://example.com", Some("promo"));
        bad.expires_at = Some(now - Duration::hours(1));

        let errors = fields(service(repo).create(1, bad, now).await.unwrap_err());

        assert!(errors.contains(URL_FIELD));
        assert!(errors.contains(ALIAS_FIELD));
        assert!(errors.contains(EXPIRES_FIELD));
    }

    #[tokio::test]
    async fn test_create_maps_insert_conflict_to_alias_error() {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_key_exists().returning(|_, _| Ok(false));
        repo.expect_next_id().returning(|| Ok(1));
        repo.expect_insert()
            .returning(|_| Err(AppError::conflict("dup", json!({ "constraint": "short_links_key_key" }))));

        let err = service(repo)
            .create(1, input("https://example.com", Some("promo")), Utc::now())
            .await
            .unwrap_err();

        assert_eq!(fields(err).first(ALIAS_FIELD), Some(ALIAS_TAKEN_MESSAGE));
    }

    #[tokio::test]
    async fn test_create_retries_default_key_on_race() {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_next_id().returning(|| Ok(1));
        repo.expect_key_exists().returning(|_, _| Ok(false));

        let mut seq = mockall::Sequence::new();
        repo.expect_insert()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::conflict("dup", json!({ "constraint": "short_links_key_key" }))));
        repo.expect_insert()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|l| Ok(stored(l)));

        let link = service(repo)
            .create(1, input("https://example.com", None), Utc::now())
            .await
            .unwrap();

        assert_eq!(link.id, 1);
    }

    #[tokio::test]
    async fn test_create_reports_form_error_when_default_key_keeps_colliding() {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_next_id().returning(|| Ok(1));
        repo.expect_key_exists().returning(|_, _| Ok(false));
        repo.expect_insert()
            .times(DEFAULT_KEY_ATTEMPTS)
            .returning(|_| Err(AppError::conflict("dup", json!({ "constraint": "short_links_key_key" }))));

        let err = service(repo)
            .create(1, input("https://example.com", None), Utc::now())
            .await
            .unwrap_err();

        assert_eq!(fields(err).form(), Some(UNIQUE_KEY_FAILED));
    }

    #[tokio::test]
    async fn test_create_with_alias() {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_key_exists().returning(|_, _| Ok(false));
        repo.expect_next_id().returning(|| Ok(4));
        repo.expect_insert()
            .withf(|l| l.key == "Promo2025")
            .returning(|l| Ok(stored(l)));

        let link = service(repo)
            .create(1, input("https://example.com", Some(" Promo2025 ")), Utc::now())
            .await
            .unwrap();

        assert_eq!(link.key, "Promo2025");
        assert_eq!(link.id, 4);
    }

    #[tokio::test]
    async fn test_edit_keeping_own_alias_succeeds() {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(existing(id, 1, "promo"))));
        repo.expect_key_exists().times(0);
        repo.expect_update()
            .withf(|id, patch, _| *id == 5 && patch.key == "promo")
            .returning(|id, patch, _| {
                let mut link = existing(id, 1, &patch.key);
                link.original_url = patch.original_url;
                Ok(link)
            });

        let link = service(repo)
            .edit(5, 1, input("https://example.org/new", Some("promo")), Utc::now())
            .await
            .unwrap();

        assert_eq!(link.original_url, "https://example.org/new");
    }

    #[tokio::test]
    async fn test_edit_blank_alias_keeps_key() {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(existing(id, 1, "abc"))));
        repo.expect_update()
            .withf(|_, patch, _| patch.key == "abc")
            .returning(|id, patch, _| Ok(existing(id, 1, &patch.key)));

        let link = service(repo)
            .edit(5, 1, input("https://example.org", Some("  ")), Utc::now())
            .await
            .unwrap();

        assert_eq!(link.key, "abc");
    }

    #[tokio::test]
    async fn test_edit_to_foreign_alias_fails() {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(existing(id, 1, "abc"))));
        repo.expect_key_exists()
            .withf(|key, exclude| key == "taken" && *exclude == Some(5))
            .returning(|_, _| Ok(true));
        repo.expect_update().times(0);

        let err = service(repo)
            .edit(5, 1, input("https://example.org", Some("taken")), Utc::now())
            .await
            .unwrap_err();

        assert_eq!(fields(err).first(ALIAS_FIELD), Some(ALIAS_TAKEN_MESSAGE));
    }

    #[tokio::test]
    async fn test_non_owner_is_forbidden_everywhere() {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(existing(id, 1, "abc"))));
        repo.expect_update().times(0);
        repo.expect_update_key().times(0);
        repo.expect_delete().times(0);

        let service = service(repo);
        let now = Utc::now();

        assert!(matches!(
            service.get_owned(5, 2).await,
            Err(AppError::Forbidden { .. })
        ));
        assert!(matches!(
            service.edit(5, 2, input("https://example.org", None), now).await,
            Err(AppError::Forbidden { .. })
        ));
        assert!(matches!(
            service.delete(5, 2).await,
            Err(AppError::Forbidden { .. })
        ));
        assert!(matches!(
            service.regenerate(5, 2, now).await,
            Err(AppError::Forbidden { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_link_is_not_found() {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        assert!(matches!(
            service(repo).get_owned(99, 1).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_owned_link() {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(existing(id, 1, "abc"))));
        repo.expect_delete()
            .withf(|id| *id == 5)
            .times(1)
            .returning(|_| Ok(true));

        assert!(service(repo).delete(5, 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_regenerate_keeps_prefix_and_changes_key() {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(existing(id, 1, "promo"))));
        repo.expect_key_exists().returning(|_, _| Ok(false));
        repo.expect_update_key()
            .returning(|id, key, _| Ok(existing(id, 1, key)));

        let link = service(repo).regenerate(62, 1, Utc::now()).await.unwrap();

        assert!(link.key.starts_with("10"));
        assert_ne!(link.key, "promo");
    }

    #[tokio::test]
    async fn test_out_of_range_default_expiry_is_an_error() {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_next_id().times(0);
        repo.expect_insert().times(0);
        let repo = Arc::new(repo);
        let keys = KeyGenerator::with_rng(repo.clone(), DEFAULT_SUFFIX_LEN, StdRng::seed_from_u64(1));
        let service = ShortLinkService::new(repo, keys, Some(Duration::MAX));

        let err = service
            .create(1, input("https://example.com", None), Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[test]
    fn test_no_default_expiry() {
        let repo = Arc::new(MockShortLinkRepository::new());
        let keys = KeyGenerator::with_rng(repo.clone(), DEFAULT_SUFFIX_LEN, StdRng::seed_from_u64(1));
        let service = ShortLinkService::new(repo, keys, None);

        assert_eq!(service.resolve_expiry(None, Utc::now()).unwrap(), None);
    }
}
