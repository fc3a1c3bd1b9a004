//! Top-level router configuration combining public endpoints and web pages.
//!
//! # Route Structure
//!
//! - `GET  /s/{key}`     - Short link redirect (public)
//! - `GET  /health`      - Health check (public)
//! - `/`, `/login`, `/logout`, `/register` - Public pages
//! - `/shorts/*`         - Owner pages (cookie session required)
//! - `/static/*`         - Static assets
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Authentication** - Cookie session on owner pages
//! - **Path normalization** - Trailing slash handling

use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::tracing;
use crate::state::AppState;
use crate::web;
use crate::web::middleware::session_auth;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::services::ServeDir;

/// Builds the router without path normalization.
///
/// Integration tests drive this directly.
pub fn build_router(state: AppState) -> Router {
    let web_protected = web::routes::protected_routes().route_layer(
        middleware::from_fn_with_state(state.clone(), session_auth::layer),
    );

    Router::new()
        .route("/s/{key}", get(redirect_handler))
        .route("/health", get(health_handler))
        .merge(web::routes::public_routes())
        .merge(web_protected)
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state)
        .layer(tracing::layer())
}

/// Constructs the application router with all routes and middleware.
///
/// Trailing slashes are trimmed before routing, so `/shorts/` and `/s/abc/`
/// reach the same handlers as `/shorts` and `/s/abc`.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(build_router(state))
}
