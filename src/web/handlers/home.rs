//! Landing page handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;

use crate::web::session::MaybeUser;

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub username: Option<String>,
}

/// Renders the public landing page.
///
/// # Endpoint
///
/// `GET /`
pub async fn home_handler(user: MaybeUser) -> impl IntoResponse {
    HomeTemplate {
        username: user.username(),
    }
}
