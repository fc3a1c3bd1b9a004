//! HTTP server initialization and runtime setup.
//!
//! Handles storage selection, database connections, migrations and the Axum
//! server lifecycle.

use crate::config::{Config, StorageBackend};
use crate::infrastructure::persistence::{
    InMemoryStore, PgSessionRepository, PgShortLinkRepository, PgUserRepository,
};
use crate::routes::app_router;
use crate::state::{AppState, Repositories};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Opens a pool using the configured limits and timeouts.
pub async fn connect_pool(config: &Config, database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    Ok(pool)
}

/// Builds the repositories for the configured backend.
///
/// For PostgreSQL this connects and applies pending migrations.
pub async fn build_repositories(config: &Config) -> Result<Repositories> {
    match (config.storage_backend, &config.database_url) {
        (StorageBackend::Postgres, Some(database_url)) => {
            let pool = connect_pool(config, database_url).await?;
            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to migrate")?;
            tracing::info!("Migrations applied");

            let pool = Arc::new(pool);
            Ok(Repositories {
                short_links: Arc::new(PgShortLinkRepository::new(pool.clone())),
                users: Arc::new(PgUserRepository::new(pool.clone())),
                sessions: Arc::new(PgSessionRepository::new(pool)),
            })
        }
        (StorageBackend::Postgres, None) => {
            anyhow::bail!("DATABASE_URL is required for the postgres storage backend")
        }
        (StorageBackend::Memory, _) => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            let store = Arc::new(InMemoryStore::new());
            Ok(Repositories {
                short_links: store.clone(),
                users: store.clone(),
                sessions: store,
            })
        }
    }
}

/// Runs the HTTP server with the given configuration.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let repositories = build_repositories(&config).await?;
    let state = AppState::new(repositories, &config);

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
