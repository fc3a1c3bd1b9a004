//! Cookie session middleware for owner pages.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;

use crate::state::AppState;
use crate::web::session::session_token;

/// Requires a signed-in user.
///
/// The `session_id` cookie is resolved through
/// [`crate::application::services::AuthService::authenticate`]; on success
/// the [`crate::domain::entities::CurrentUser`] is stored in the request
/// extensions for handlers to pick up with `Extension<CurrentUser>`.
///
/// Anonymous requests are redirected to `/login?next=<original path>` rather
/// than rejected, since the pages are browsed by people.
///
/// # Example
///
/// ```rust,ignore
/// let protected = web::routes::protected_routes()
///     .route_layer(middleware::from_fn_with_state(state.clone(), session_auth::layer));
/// ```
pub async fn layer(State(st): State<AppState>, mut req: Request, next: Next) -> Response {
    let user = match session_token(req.headers()) {
        Some(token) => match st.auth_service.authenticate(&token, Utc::now()).await {
            Ok(user) => user,
            Err(e) => return e.into_response(),
        },
        None => None,
    };

    match user {
        Some(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        None => {
            let target = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            let next_param: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
            Redirect::to(&format!("/login?next={next_param}")).into_response()
        }
    }
}
