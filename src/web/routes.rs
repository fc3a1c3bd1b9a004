//! Web page route configuration.

use crate::state::AppState;
use crate::web::handlers::{
    create_page, create_submit, delete_page, delete_submit, edit_page, edit_submit, home_handler,
    list_handler, login_page, login_submit, logout_submit, register_page, register_submit,
    regenerate_page, regenerate_submit, stats_handler,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Owner pages requiring a signed-in user.
///
/// Protected via [`crate::web::middleware::session_auth`].
///
/// # Endpoints
///
/// - `GET /shorts` - The user's links
/// - `GET|POST /shorts/create` - Create form
/// - `GET|POST /shorts/{id}/edit` - Edit form
/// - `GET|POST /shorts/{id}/delete` - Confirmation, then delete
/// - `GET|POST /shorts/{id}/regenerate` - Confirmation, then new key
/// - `GET /shorts/{id}/stats` - Metadata and QR code
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/shorts", get(list_handler))
        .route("/shorts/create", get(create_page).post(create_submit))
        .route("/shorts/{id}/edit", get(edit_page).post(edit_submit))
        .route("/shorts/{id}/delete", get(delete_page).post(delete_submit))
        .route(
            "/shorts/{id}/regenerate",
            get(regenerate_page).post(regenerate_submit),
        )
        .route("/shorts/{id}/stats", get(stats_handler))
}

/// Pages open to anonymous visitors.
///
/// # Endpoints
///
/// - `GET /` - Landing page
/// - `GET|POST /login` - Sign in
/// - `POST /logout` - Sign out
/// - `GET|POST /register` - Create an account
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home_handler))
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", post(logout_submit))
        .route("/register", get(register_page).post(register_submit))
}
