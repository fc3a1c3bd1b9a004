//! PostgreSQL implementation of the short link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{NewShortLink, ShortLink, ShortLinkPatch};
use crate::domain::repositories::ShortLinkRepository;
use crate::error::AppError;

const LINK_COLUMNS: &str =
    "id, owner_id, original_url, key, clicks, created_at, updated_at, expires_at";

#[derive(FromRow)]
struct ShortLinkRow {
    id: i64,
    owner_id: i64,
    original_url: String,
    key: String,
    clicks: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl From<ShortLinkRow> for ShortLink {
    fn from(r: ShortLinkRow) -> Self {
        ShortLink {
            id: r.id,
            owner_id: r.owner_id,
            original_url: r.original_url,
            key: r.key,
            clicks: r.clicks,
            created_at: r.created_at,
            updated_at: r.updated_at,
            expires_at: r.expires_at,
        }
    }
}

#[derive(FromRow)]
struct ShortLinkWithOwnerRow {
    #[sqlx(flatten)]
    link: ShortLinkRow,
    username: String,
}

fn not_found(id: i64) -> AppError {
    AppError::not_found("Short link not found", json!({ "id": id }))
}

/// PostgreSQL repository for short links.
///
/// Key uniqueness is enforced by the `short_links_key_key` constraint and
/// click counting by a single `UPDATE ... SET clicks = clicks + 1`.
pub struct PgShortLinkRepository {
    pool: Arc<PgPool>,
}

impl PgShortLinkRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShortLinkRepository for PgShortLinkRepository {
    async fn next_id(&self) -> Result<i64, AppError> {
        let id: i64 = sqlx::query_scalar("SELECT nextval(pg_get_serial_sequence('short_links', 'id'))")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(id)
    }

    async fn insert(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        let row = sqlx::query_as::<_, ShortLinkRow>(&format!(
            r#"
            INSERT INTO short_links (id, owner_id, original_url, key, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(new_link.id)
        .bind(new_link.owner_id)
        .bind(&new_link.original_url)
        .bind(&new_link.key)
        .bind(new_link.expires_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn key_exists(&self, key: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM short_links
                WHERE key = $1 AND ($2::bigint IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(key)
        .bind(exclude_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(exists)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ShortLink>, AppError> {
        let row = sqlx::query_as::<_, ShortLinkRow>(&format!(
            "SELECT {LINK_COLUMNS} FROM short_links WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<ShortLink>, AppError> {
        let row = sqlx::query_as::<_, ShortLinkRow>(&format!(
            "SELECT {LINK_COLUMNS} FROM short_links WHERE key = $1"
        ))
        .bind(key)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<ShortLink>, AppError> {
        let rows = sqlx::query_as::<_, ShortLinkRow>(&format!(
            r#"
            SELECT {LINK_COLUMNS} FROM short_links
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(owner_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_all(&self, search: Option<String>) -> Result<Vec<(ShortLink, String)>, AppError> {
        let pattern = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));

        let rows = sqlx::query_as::<_, ShortLinkWithOwnerRow>(
            r#"
            SELECT l.id, l.owner_id, l.original_url, l.key, l.clicks,
                   l.created_at, l.updated_at, l.expires_at, u.username
            FROM short_links l
            JOIN users u ON u.id = l.owner_id
            WHERE $1::text IS NULL
               OR l.key ILIKE $1
               OR l.original_url ILIKE $1
               OR u.username ILIKE $1
            ORDER BY l.created_at DESC, l.id DESC
            "#,
        )
        .bind(pattern)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.link.into(), r.username))
            .collect())
    }

    async fn update(
        &self,
        id: i64,
        patch: ShortLinkPatch,
        now: DateTime<Utc>,
    ) -> Result<ShortLink, AppError> {
        let row = sqlx::query_as::<_, ShortLinkRow>(&format!(
            r#"
            UPDATE short_links
            SET original_url = $2, key = $3, expires_at = $4, updated_at = $5
            WHERE id = $1
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&patch.original_url)
        .bind(&patch.key)
        .bind(patch.expires_at)
        .bind(now)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Into::into).ok_or_else(|| not_found(id))
    }

    async fn update_key(&self, id: i64, key: &str, now: DateTime<Utc>) -> Result<ShortLink, AppError> {
        let row = sqlx::query_as::<_, ShortLinkRow>(&format!(
            r#"
            UPDATE short_links
            SET key = $2, updated_at = $3
            WHERE id = $1
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(key)
        .bind(now)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(Into::into).ok_or_else(|| not_found(id))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM short_links WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_clicks(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE short_links SET clicks = clicks + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }
}
