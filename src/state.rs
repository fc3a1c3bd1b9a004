//! Shared application state injected into every handler.

use chrono::Duration;
use std::sync::Arc;

use crate::application::services::{AuthService, KeyGenerator, RedirectService, ShortLinkService};
use crate::config::Config;
use crate::domain::repositories::{SessionRepository, ShortLinkRepository, UserRepository};

/// Request-independent settings the web layer needs.
#[derive(Debug, Clone)]
pub struct WebSettings {
    /// Origin for absolute short URLs; `None` derives it from the request.
    pub public_base_url: Option<String>,
    pub secure_cookies: bool,
}

/// Repositories behind trait objects, so the same state works for
/// PostgreSQL and the in-memory store.
#[derive(Clone)]
pub struct Repositories {
    pub short_links: Arc<dyn ShortLinkRepository>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
}

#[derive(Clone)]
pub struct AppState {
    pub short_link_service: Arc<ShortLinkService<dyn ShortLinkRepository>>,
    pub redirect_service: Arc<RedirectService<dyn ShortLinkRepository>>,
    pub auth_service: Arc<AuthService<dyn UserRepository, dyn SessionRepository>>,
    /// Used directly only by the health check.
    pub short_link_repository: Arc<dyn ShortLinkRepository>,
    pub settings: WebSettings,
}

impl AppState {
    /// Wires services over `repositories` using `config`.
    pub fn new(repositories: Repositories, config: &Config) -> Self {
        let keys = KeyGenerator::new(
            repositories.short_links.clone(),
            config.regenerate_suffix_len,
        );

        Self::with_parts(
            repositories,
            keys,
            config.default_expiry(),
            config.session_signing_secret.clone(),
            config.session_ttl(),
            WebSettings {
                public_base_url: config.public_base_url.clone(),
                secure_cookies: config.secure_cookies,
            },
        )
    }

    /// Wires services from explicit parts; tests use this to pin the RNG.
    pub fn with_parts(
        repositories: Repositories,
        keys: KeyGenerator<dyn ShortLinkRepository>,
        default_expiry: Option<Duration>,
        session_signing_secret: String,
        session_ttl: Duration,
        settings: WebSettings,
    ) -> Self {
        let Repositories {
            short_links,
            users,
            sessions,
        } = repositories;

        Self {
            short_link_service: Arc::new(ShortLinkService::new(
                short_links.clone(),
                keys,
                default_expiry,
            )),
            redirect_service: Arc::new(RedirectService::new(short_links.clone())),
            auth_service: Arc::new(AuthService::new(
                users,
                sessions,
                session_signing_secret,
                session_ttl,
            )),
            short_link_repository: short_links,
            settings,
        }
    }
}
