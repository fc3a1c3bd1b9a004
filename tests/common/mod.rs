#![allow(dead_code)]

use axum::Router;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use short_links::application::services::KeyGenerator;
use short_links::domain::entities::{NewShortLink, ShortLink};
use short_links::domain::repositories::ShortLinkRepository;
use short_links::infrastructure::persistence::InMemoryStore;
use short_links::routes::build_router;
use short_links::state::{AppState, Repositories, WebSettings};
use std::sync::Arc;

pub const BASE_URL: &str = "http://short.test";
pub const PASSWORD: &str = "correct-horse-battery";

pub fn create_test_state(store: Arc<InMemoryStore>) -> AppState {
    let repositories = Repositories {
        short_links: store.clone(),
        users: store.clone(),
        sessions: store,
    };
    let keys = KeyGenerator::with_rng(
        repositories.short_links.clone(),
        4,
        StdRng::seed_from_u64(42),
    );

    AppState::with_parts(
        repositories,
        keys,
        Some(Duration::days(30)),
        "test-signing-secret".to_string(),
        Duration::hours(1),
        WebSettings {
            public_base_url: Some(BASE_URL.to_string()),
            secure_cookies: false,
        },
    )
}

pub fn create_test_app() -> (Router, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let app = build_router(create_test_state(store.clone()));
    (app, store)
}

pub fn create_test_server() -> (TestServer, Arc<InMemoryStore>) {
    let (app, store) = create_test_app();
    (TestServer::new(app).unwrap(), store)
}

/// Registers `username`, logs in and returns the `name=value` cookie pair.
pub async fn sign_up_and_log_in(server: &TestServer, username: &str) -> String {
    let email = format!("{username}@example.com");

    let response = server
        .post("/register")
        .form(&[
            ("username", username),
            ("email", email.as_str()),
            ("password", PASSWORD),
            ("password_confirm", PASSWORD),
        ])
        .await;
    assert_eq!(response.status_code(), 303, "{}", response.text());

    let response = server
        .post("/login")
        .form(&[("username", username), ("password", PASSWORD)])
        .await;
    assert_eq!(response.status_code(), 303, "{}", response.text());

    session_cookie(&response)
}

pub fn session_cookie(response: &axum_test::TestResponse) -> String {
    let set_cookie = response
        .headers()
        .get("set-cookie")
        .expect("login sets a cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

/// Creates a link through the form and returns it as stored.
pub async fn create_link(
    server: &TestServer,
    store: &InMemoryStore,
    cookie: &str,
    url: &str,
    custom_key: &str,
) -> ShortLink {
    let response = server
        .post("/shorts/create")
        .add_header("cookie", cookie)
        .form(&[
            ("original_url", url),
            ("custom_key", custom_key),
            ("expires_at", ""),
        ])
        .await;
    assert_eq!(response.status_code(), 303, "{}", response.text());

    newest_link(store).await.expect("link was stored")
}

/// The most recently created link across all owners.
pub async fn newest_link(store: &InMemoryStore) -> Option<ShortLink> {
    store
        .list_all(None)
        .await
        .unwrap()
        .into_iter()
        .map(|(link, _)| link)
        .max_by_key(|link| link.id)
}

/// Inserts a link directly, bypassing form validation.
pub async fn insert_link(
    store: &InMemoryStore,
    owner_id: i64,
    key: &str,
    url: &str,
    expires_in: Option<Duration>,
) -> ShortLink {
    let id = store.next_id().await.unwrap();
    store
        .insert(NewShortLink {
            id,
            owner_id,
            original_url: url.to_string(),
            key: key.to_string(),
            expires_at: expires_in.map(|d| Utc::now() + d),
        })
        .await
        .unwrap()
}
