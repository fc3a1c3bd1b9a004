//! Login, logout and registration pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;

use crate::application::services::Registration;
use crate::error::{AppError, FieldErrors};
use crate::state::AppState;
use crate::web::forms::{LoginForm, NextQuery};
use crate::web::session::{MaybeUser, clear_session_cookie, safe_next, session_cookie, session_token};

#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub username: Option<String>,
    pub form_username: String,
    pub next: String,
    pub errors: FieldErrors,
}

#[derive(Template, WebTemplate)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub username: Option<String>,
    pub form_username: String,
    pub form_email: String,
    pub form_phone: String,
    pub form_address: String,
    pub errors: FieldErrors,
}

/// `GET /login`
pub async fn login_page(user: MaybeUser, Query(query): Query<NextQuery>) -> impl IntoResponse {
    LoginTemplate {
        username: user.username(),
        form_username: String::new(),
        next: safe_next(query.next.as_deref()),
        errors: FieldErrors::new(),
    }
}

/// `POST /login`
///
/// On success sets the `session_id` cookie and redirects to `next` when it
/// is a local path, else to `/`.
pub async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let next = safe_next(form.next.as_deref());

    match state
        .auth_service
        .login(&form.username, &form.password, Utc::now())
        .await
    {
        Ok(session) => {
            let cookie = session_cookie(
                &session.token,
                state.auth_service.session_ttl().num_seconds(),
                state.settings.secure_cookies,
            );
            Ok(([(SET_COOKIE, cookie)], Redirect::to(&next)).into_response())
        }
        Err(AppError::Validation { fields, .. }) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            LoginTemplate {
                username: None,
                form_username: form.username,
                next,
                errors: fields,
            },
        )
            .into_response()),
        Err(e) => Err(e),
    }
}

/// `POST /logout`
pub async fn logout_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(token) = session_token(&headers) {
        state.auth_service.logout(&token, Utc::now()).await?;
    }

    Ok((
        [(SET_COOKIE, clear_session_cookie(state.settings.secure_cookies))],
        Redirect::to("/login"),
    )
        .into_response())
}

/// `GET /register`
pub async fn register_page(user: MaybeUser) -> impl IntoResponse {
    RegisterTemplate {
        username: user.username(),
        form_username: String::new(),
        form_email: String::new(),
        form_phone: String::new(),
        form_address: String::new(),
        errors: FieldErrors::new(),
    }
}

/// `POST /register`
///
/// Passwords are never echoed back when the form is re-rendered.
pub async fn register_submit(
    State(state): State<AppState>,
    Form(form): Form<Registration>,
) -> Result<Response, AppError> {
    let form_username = form.username.clone();
    let form_email = form.email.clone();
    let form_phone = form.phone.clone();
    let form_address = form.address.clone();

    match state.auth_service.register(form).await {
        Ok(_) => Ok(Redirect::to("/login").into_response()),
        Err(AppError::Validation { fields, .. }) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            RegisterTemplate {
                username: None,
                form_username,
                form_email,
                form_phone,
                form_address,
                errors: fields,
            },
        )
            .into_response()),
        Err(e) => Err(e),
    }
}
