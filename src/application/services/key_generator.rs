//! Short key generation and uniqueness checks.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use std::sync::{Arc, Mutex};

use crate::domain::repositories::ShortLinkRepository;
use crate::error::AppError;
use crate::utils::alias::{ALIAS_FIELD, validate_custom_alias};
use crate::utils::base62;
use chrono::{DateTime, Utc};

/// Random suffix length used by regeneration unless configured otherwise.
pub const DEFAULT_SUFFIX_LEN: usize = 4;

/// Fresh suffixes drawn after the first collision before falling back to a timestamp.
pub const REGENERATE_MAX_RETRIES: usize = 10;

pub const ALIAS_TAKEN_MESSAGE: &str = "This alias is already taken. Please choose another.";

pub const UNIQUE_KEY_FAILED: &str = "Could not generate a unique key. Please try again.";

/// Validation error reported when an alias is in use.
pub fn alias_taken() -> AppError {
    AppError::field(ALIAS_FIELD, ALIAS_TAKEN_MESSAGE)
}

/// Produces keys for short links.
///
/// - Default keys are `base62(id)`, with `1`, `2`, ... appended on collision.
/// - Custom aliases are validated and checked against existing keys.
/// - Regenerated keys are `base62(id)` plus a random suffix, retried on
///   collision, with the Unix timestamp as last resort.
///
/// The random source is held behind a mutex and only locked while drawing,
/// so no guard lives across a store call.
pub struct KeyGenerator<R: ShortLinkRepository + ?Sized> {
    repository: Arc<R>,
    suffix_len: usize,
    rng: Mutex<StdRng>,
}

impl<R: ShortLinkRepository + ?Sized> KeyGenerator<R> {
    /// Creates a generator seeded from the operating system.
    pub fn new(repository: Arc<R>, suffix_len: usize) -> Self {
        Self::with_rng(repository, suffix_len, StdRng::from_os_rng())
    }

    /// Creates a generator drawing suffixes from `rng`.
    pub fn with_rng(repository: Arc<R>, suffix_len: usize, rng: StdRng) -> Self {
        Self {
            repository,
            suffix_len,
            rng: Mutex::new(rng),
        }
    }

    pub fn suffix_len(&self) -> usize {
        self.suffix_len
    }

    /// Derives the default key for a freshly reserved identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] for negative identifiers or store errors.
    pub async fn derive_default_key(&self, id: i64) -> Result<String, AppError> {
        let base = prefix_for(id)?;

        let mut candidate = base.clone();
        let mut suffix: u64 = 0;
        while self.repository.key_exists(&candidate, None).await? {
            suffix += 1;
            candidate = format!("{base}{suffix}");
        }

        if suffix > 0 {
            tracing::debug!(id, key = %candidate, "Default key collided, suffixed");
        }

        Ok(candidate)
    }

    /// Checks that a user-supplied alias is well-formed and free.
    ///
    /// `exclude_id` skips the link being edited so it can keep its own alias.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] on the `custom_key` field when the alias
    /// is malformed or taken.
    pub async fn ensure_alias_available(
        &self,
        alias: &str,
        exclude_id: Option<i64>,
    ) -> Result<(), AppError> {
        validate_custom_alias(alias)?;

        if self.repository.key_exists(alias, exclude_id).await? {
            return Err(alias_taken());
        }

        Ok(())
    }

    /// Picks a new key for link `id` keeping `base62(id)` as prefix.
    ///
    /// Draws one suffix, then up to [`REGENERATE_MAX_RETRIES`] more while the
    /// candidate is taken. When every draw collides the key becomes the prefix
    /// followed by `now` in Unix seconds.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] on the `key` field if even the
    /// timestamp key is taken.
    pub async fn regenerate(&self, id: i64, now: DateTime<Utc>) -> Result<String, AppError> {
        let prefix = prefix_for(id)?;

        let mut candidate = self.draw(&prefix);
        let mut retries = 0;
        while self.repository.key_exists(&candidate, None).await? {
            if retries == REGENERATE_MAX_RETRIES {
                return self.timestamp_fallback(id, &prefix, now).await;
            }
            retries += 1;
            candidate = self.draw(&prefix);
        }

        Ok(candidate)
    }

    async fn timestamp_fallback(
        &self,
        id: i64,
        prefix: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let fallback = format!("{prefix}{}", now.timestamp());
        tracing::warn!(id, key = %fallback, "Random suffixes exhausted, using timestamp key");

        if self.repository.key_exists(&fallback, None).await? {
            return Err(AppError::field("key", UNIQUE_KEY_FAILED));
        }

        Ok(fallback)
    }

    fn draw(&self, prefix: &str) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let suffix = base62::random_suffix(&mut *rng, base62::ALPHABET, self.suffix_len);
        format!("{prefix}{suffix}")
    }
}

fn prefix_for(id: i64) -> Result<String, AppError> {
    let id = u64::try_from(id)
        .map_err(|_| AppError::internal("Negative link identifier", json!({ "id": id })))?;
    Ok(base62::encode(id))
}
