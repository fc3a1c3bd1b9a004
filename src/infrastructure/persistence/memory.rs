//! Process-local store implementing every repository trait.
//!
//! Used by `STORAGE_BACKEND=memory` and by the HTTP tests. The uniqueness of
//! keys and usernames and the click increment are applied under one write
//! lock, which gives the same guarantees the PostgreSQL constraints give.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::entities::{NewShortLink, NewUser, Session, ShortLink, ShortLinkPatch, User};
use crate::domain::repositories::{SessionRepository, ShortLinkRepository, UserRepository};
use crate::error::AppError;
use crate::utils::db_error::{SHORT_LINK_KEY_CONSTRAINT, USERNAME_CONSTRAINT};

#[derive(Default)]
struct Tables {
    links: BTreeMap<i64, ShortLink>,
    link_seq: i64,
    users: BTreeMap<i64, User>,
    user_seq: i64,
    sessions: BTreeMap<String, Session>,
    session_seq: i64,
}

impl Tables {
    fn key_taken(&self, key: &str, exclude_id: Option<i64>) -> bool {
        self.links
            .values()
            .any(|l| l.key == key && Some(l.id) != exclude_id)
    }
}

fn conflict(constraint: &str) -> AppError {
    AppError::conflict(
        "Unique constraint violation",
        json!({ "constraint": constraint }),
    )
}

fn link_not_found(id: i64) -> AppError {
    AppError::not_found("Short link not found", json!({ "id": id }))
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ShortLinkRepository for InMemoryStore {
    async fn next_id(&self) -> Result<i64, AppError> {
        let mut tables = self.write();
        tables.link_seq += 1;
        Ok(tables.link_seq)
    }

    async fn insert(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        let mut tables = self.write();

        if tables.key_taken(&new_link.key, None) {
            return Err(conflict(SHORT_LINK_KEY_CONSTRAINT));
        }
        if tables.links.contains_key(&new_link.id) {
            return Err(conflict("short_links_pkey"));
        }

        let now = Utc::now();
        let link = ShortLink {
            id: new_link.id,
            owner_id: new_link.owner_id,
            original_url: new_link.original_url,
            key: new_link.key,
            clicks: 0,
            created_at: now,
            updated_at: now,
            expires_at: new_link.expires_at,
        };
        tables.link_seq = tables.link_seq.max(link.id);
        tables.links.insert(link.id, link.clone());

        Ok(link)
    }

    async fn key_exists(&self, key: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        Ok(self.read().key_taken(key, exclude_id))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ShortLink>, AppError> {
        Ok(self.read().links.get(&id).cloned())
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<ShortLink>, AppError> {
        Ok(self.read().links.values().find(|l| l.key == key).cloned())
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<ShortLink>, AppError> {
        let mut links: Vec<ShortLink> = self
            .read()
            .links
            .values()
            .filter(|l| l.owner_id == owner_id)
            .cloned()
            .collect();
        links.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(links)
    }

    async fn list_all(&self, search: Option<String>) -> Result<Vec<(ShortLink, String)>, AppError> {
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let tables = self.read();
        let mut rows: Vec<(ShortLink, String)> = tables
            .links
            .values()
            .filter_map(|l| {
                let owner = tables.users.get(&l.owner_id)?.username.clone();
                Some((l.clone(), owner))
            })
            .filter(|(l, owner)| match &needle {
                Some(n) => {
                    l.key.to_lowercase().contains(n)
                        || l.original_url.to_lowercase().contains(n)
                        || owner.to_lowercase().contains(n)
                }
                None => true,
            })
            .collect();
        rows.sort_by(|(a, _), (b, _)| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn update(
        &self,
        id: i64,
        patch: ShortLinkPatch,
        now: DateTime<Utc>,
    ) -> Result<ShortLink, AppError> {
        let mut tables = self.write();

        if tables.key_taken(&patch.key, Some(id)) {
            return Err(conflict(SHORT_LINK_KEY_CONSTRAINT));
        }

        let link = tables.links.get_mut(&id).ok_or_else(|| link_not_found(id))?;
        link.original_url = patch.original_url;
        link.key = patch.key;
        link.expires_at = patch.expires_at;
        link.updated_at = now;

        Ok(link.clone())
    }

    async fn update_key(&self, id: i64, key: &str, now: DateTime<Utc>) -> Result<ShortLink, AppError> {
        let mut tables = self.write();

        if tables.key_taken(key, Some(id)) {
            return Err(conflict(SHORT_LINK_KEY_CONSTRAINT));
        }

        let link = tables.links.get_mut(&id).ok_or_else(|| link_not_found(id))?;
        link.key = key.to_string();
        link.updated_at = now;

        Ok(link.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.write().links.remove(&id).is_some())
    }

    async fn increment_clicks(&self, id: i64) -> Result<bool, AppError> {
        match self.write().links.get_mut(&id) {
            Some(link) => {
                link.clicks += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut tables = self.write();

        if tables.users.values().any(|u| u.username == new_user.username) {
            return Err(conflict(USERNAME_CONSTRAINT));
        }

        tables.user_seq += 1;
        let user = User {
            id: tables.user_seq,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            phone: new_user.phone,
            address: new_user.address,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.read().users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.read().users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}

#[async_trait]
impl SessionRepository for InMemoryStore {
    async fn create(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, AppError> {
        let mut tables = self.write();

        if tables.sessions.contains_key(token_hash) {
            return Err(conflict("sessions_token_hash_key"));
        }

        tables.session_seq += 1;
        let session = Session {
            id: tables.session_seq,
            user_id,
            token_hash: token_hash.to_string(),
            created_at: Utc::now(),
            expires_at,
        };
        tables
            .sessions
            .insert(session.token_hash.clone(), session.clone());

        Ok(session)
    }

    async fn find_active(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, AppError> {
        Ok(self
            .read()
            .sessions
            .get(token_hash)
            .filter(|s| s.is_active_at(now))
            .cloned())
    }

    async fn delete(&self, token_hash: &str) -> Result<(), AppError> {
        self.write().sessions.remove(token_hash);
        Ok(())
    }

    async fn purge_expired(&self, user_id: i64, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tables = self.write();
        let before = tables.sessions.len();
        tables
            .sessions
            .retain(|_, s| s.user_id != user_id || s.is_active_at(now));
        Ok((before - tables.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    async fn store_with_user() -> (InMemoryStore, i64) {
        let store = InMemoryStore::new();
        let user = UserRepository::create(
            &store,
            NewUser {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: "x".to_string(),
                phone: String::new(),
                address: String::new(),
            },
        )
        .await
        .unwrap();
        (store, user.id)
    }

    async fn add_link(store: &InMemoryStore, owner_id: i64, key: &str) -> ShortLink {
        let id = store.next_id().await.unwrap();
        store
            .insert(NewShortLink {
                id,
                owner_id,
                original_url: "https://example.com/".to_string(),
                key: key.to_string(),
                expires_at: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_key() {
        let (store, owner) = store_with_user().await;
        add_link(&store, owner, "abc").await;

        let err = store
            .insert(NewShortLink {
                id: 99,
                owner_id: owner,
                original_url: "https://example.org/".to_string(),
                key: "abc".to_string(),
                expires_at: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.conflict_constraint(), Some(SHORT_LINK_KEY_CONSTRAINT));
    }

    #[tokio::test]
    async fn test_key_exists_excludes_own_id() {
        let (store, owner) = store_with_user().await;
        let link = add_link(&store, owner, "abc").await;

        assert!(store.key_exists("abc", None).await.unwrap());
        assert!(!store.key_exists("abc", Some(link.id)).await.unwrap());
        assert!(!store.key_exists("ABC", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_key_conflict() {
        let (store, owner) = store_with_user().await;
        add_link(&store, owner, "one").await;
        let second = add_link(&store, owner, "two").await;

        let err = store
            .update_key(second.id, "one", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let (store, owner) = store_with_user().await;
        let link = add_link(&store, owner, "hot").await;
        let store = Arc::new(store);

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.increment_clicks(link.id).await })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().unwrap());
        }

        let stored = ShortLinkRepository::find_by_id(store.as_ref(), link.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.clicks, 50);
    }

    #[tokio::test]
    async fn test_increment_does_not_touch_updated_at() {
        let (store, owner) = store_with_user().await;
        let link = add_link(&store, owner, "k").await;

        store.increment_clicks(link.id).await.unwrap();

        let stored = ShortLinkRepository::find_by_id(&store, link.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.updated_at, link.updated_at);
    }

    #[tokio::test]
    async fn test_list_all_searches_owner() {
        let (store, owner) = store_with_user().await;
        add_link(&store, owner, "abc").await;

        assert_eq!(store.list_all(Some("ALI".to_string())).await.unwrap().len(), 1);
        assert!(store.list_all(Some("bob".to_string())).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let (store, _) = store_with_user().await;
        let err = UserRepository::create(
            &store,
            NewUser {
                username: "alice".to_string(),
                email: "other@example.com".to_string(),
                password_hash: "y".to_string(),
                phone: String::new(),
                address: String::new(),
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.conflict_constraint(), Some(USERNAME_CONSTRAINT));
    }

    #[tokio::test]
    async fn test_sessions_expire_and_purge() {
        let (store, user_id) = store_with_user().await;
        let now = Utc::now();

        SessionRepository::create(&store, user_id, "old", now - Duration::hours(1))
            .await
            .unwrap();
        SessionRepository::create(&store, user_id, "new", now + Duration::hours(1))
            .await
            .unwrap();

        assert!(store.find_active("old", now).await.unwrap().is_none());
        assert!(store.find_active("new", now).await.unwrap().is_some());
        assert_eq!(store.purge_expired(user_id, now).await.unwrap(), 1);
    }
}
