//! Owner pages for managing short links.
//!
//! Every handler here runs behind
//! [`crate::web::middleware::session_auth::layer`], which provides the
//! [`CurrentUser`]. Ownership is checked by the service.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Extension, Form,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};

use crate::domain::entities::{CurrentUser, ShortLink};
use crate::error::{AppError, FieldErrors};
use crate::state::AppState;
use crate::utils::qr::try_svg_data_uri;
use crate::utils::request_origin::{absolute_url, request_origin};
use crate::web::forms::ShortLinkForm;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// A link as shown in tables and detail pages.
pub struct LinkView {
    pub id: i64,
    pub key: String,
    pub short_path: String,
    pub original_url: String,
    pub clicks: i64,
    pub created_at: String,
    pub updated_at: String,
    pub expires_at: Option<String>,
    pub expired: bool,
}

impl LinkView {
    fn new(link: &ShortLink, now: DateTime<Utc>) -> Self {
        Self {
            id: link.id,
            key: link.key.clone(),
            short_path: link.short_path(),
            original_url: link.original_url.clone(),
            clicks: link.clicks,
            created_at: link.created_at.format(DATE_FORMAT).to_string(),
            updated_at: link.updated_at.format(DATE_FORMAT).to_string(),
            expires_at: link.expires_at.map(|e| e.format(DATE_FORMAT).to_string()),
            expired: link.is_expired_at(now),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "shorts/list.html")]
pub struct ListTemplate {
    pub username: Option<String>,
    pub links: Vec<LinkView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "shorts/create.html")]
pub struct CreateTemplate {
    pub username: Option<String>,
    pub form: ShortLinkForm,
    pub errors: FieldErrors,
}

#[derive(Template, WebTemplate)]
#[template(path = "shorts/edit.html")]
pub struct EditTemplate {
    pub username: Option<String>,
    pub link: LinkView,
    pub form: ShortLinkForm,
    pub errors: FieldErrors,
}

#[derive(Template, WebTemplate)]
#[template(path = "shorts/delete.html")]
pub struct DeleteTemplate {
    pub username: Option<String>,
    pub link: LinkView,
}

#[derive(Template, WebTemplate)]
#[template(path = "shorts/regenerate.html")]
pub struct RegenerateTemplate {
    pub username: Option<String>,
    pub link: LinkView,
    pub errors: FieldErrors,
}

#[derive(Template, WebTemplate)]
#[template(path = "shorts/stats.html")]
pub struct StatsTemplate {
    pub username: Option<String>,
    pub link: LinkView,
    pub short_url: String,
    pub qr_data_uri: Option<String>,
}

fn redirect_to_list() -> Response {
    Redirect::to("/shorts").into_response()
}

/// `GET /shorts` - the user's links, newest first.
pub async fn list_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let links = state.short_link_service.list(user.id).await?;

    Ok(ListTemplate {
        username: Some(user.username),
        links: links.iter().map(|l| LinkView::new(l, now)).collect(),
    })
}

/// `GET /shorts/create`
pub async fn create_page(Extension(user): Extension<CurrentUser>) -> impl IntoResponse {
    CreateTemplate {
        username: Some(user.username),
        form: ShortLinkForm::default(),
        errors: FieldErrors::new(),
    }
}

/// `POST /shorts/create`
pub async fn create_submit(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<ShortLinkForm>,
) -> Result<Response, AppError> {
    let result = match form.to_input() {
        Ok(input) => {
            state
                .short_link_service
                .create(user.id, input, Utc::now())
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(_) => Ok(redirect_to_list()),
        Err(AppError::Validation { fields, .. }) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            CreateTemplate {
                username: Some(user.username),
                form,
                errors: fields,
            },
        )
            .into_response()),
        Err(e) => Err(e),
    }
}

/// `GET /shorts/{id}/edit`
pub async fn edit_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let link = state.short_link_service.get_owned(id, user.id).await?;

    Ok(EditTemplate {
        username: Some(user.username),
        form: ShortLinkForm::from_link(&link),
        link: LinkView::new(&link, Utc::now()),
        errors: FieldErrors::new(),
    })
}

/// `POST /shorts/{id}/edit`
pub async fn edit_submit(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Form(form): Form<ShortLinkForm>,
) -> Result<Response, AppError> {
    let link = state.short_link_service.get_owned(id, user.id).await?;
    let now = Utc::now();

    let result = match form.to_input() {
        Ok(input) => state.short_link_service.edit(id, user.id, input, now).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(_) => Ok(redirect_to_list()),
        Err(AppError::Validation { fields, .. }) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            EditTemplate {
                username: Some(user.username),
                link: LinkView::new(&link, now),
                form,
                errors: fields,
            },
        )
            .into_response()),
        Err(e) => Err(e),
    }
}

/// `GET /shorts/{id}/delete` - confirmation page, changes nothing.
pub async fn delete_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let link = state.short_link_service.get_owned(id, user.id).await?;

    Ok(DeleteTemplate {
        username: Some(user.username),
        link: LinkView::new(&link, Utc::now()),
    })
}

/// `POST /shorts/{id}/delete`
pub async fn delete_submit(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    state.short_link_service.delete(id, user.id).await?;
    Ok(redirect_to_list())
}

/// `GET /shorts/{id}/regenerate` - confirmation page, changes nothing.
pub async fn regenerate_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let link = state.short_link_service.get_owned(id, user.id).await?;

    Ok(RegenerateTemplate {
        username: Some(user.username),
        link: LinkView::new(&link, Utc::now()),
        errors: FieldErrors::new(),
    })
}

/// `POST /shorts/{id}/regenerate`
pub async fn regenerate_submit(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let now = Utc::now();

    match state.short_link_service.regenerate(id, user.id, now).await {
        Ok(_) => Ok(redirect_to_list()),
        Err(AppError::Validation { fields, .. }) => {
            let link = state.short_link_service.get_owned(id, user.id).await?;
            Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                RegenerateTemplate {
                    username: Some(user.username),
                    link: LinkView::new(&link, now),
                    errors: fields,
                },
            )
                .into_response())
        }
        Err(e) => Err(e),
    }
}

/// `GET /shorts/{id}/stats` - link metadata and a QR code of the short URL.
///
/// The QR image is left out if it cannot be rendered.
pub async fn stats_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let link = state.short_link_service.get_owned(id, user.id).await?;
    let view = LinkView::new(&link, Utc::now());

    let short_url = match request_origin(&headers, state.settings.public_base_url.as_deref()) {
        Ok(origin) => absolute_url(&origin, &view.short_path),
        Err(e) => {
            tracing::debug!(error = %e, "No origin for absolute short URL");
            view.short_path.clone()
        }
    };
    let qr_data_uri = try_svg_data_uri(&short_url);

    Ok(StatsTemplate {
        username: Some(user.username),
        link: view,
        short_url,
        qr_data_uri,
    })
}
