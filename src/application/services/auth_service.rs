//! Account registration and cookie sessions.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use std::borrow::Cow;
use std::sync::{Arc, LazyLock};
use validator::{Validate, ValidationError};

use crate::domain::entities::{CurrentUser, NewUser, User};
use crate::domain::repositories::{SessionRepository, UserRepository};
use crate::error::{AppError, FORM_FIELD};
use crate::utils::db_error::USERNAME_CONSTRAINT;
use crate::utils::password::{hash_password, verify_password};

type HmacSha256 = Hmac<Sha256>;

/// Bytes of entropy in a session token.
const TOKEN_BYTES: usize = 16;

const USERNAME_TAKEN: &str = "A user with that username already exists.";
const BAD_CREDENTIALS: &str = "Please enter a correct username and password.";

static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));

/// Sign-up form.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct Registration {
    #[validate(
        length(min = 1, max = 150, message = "Username must be 1-150 characters."),
        regex(
            path = "*USERNAME_REGEX",
            message = "Use only letters, digits and @/./+/-/_ characters."
        )
    )]
    pub username: String,

    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    #[validate(
        length(min = 8, message = "This password is too short. It must contain at least 8 characters."),
        custom(function = "not_entirely_numeric")
    )]
    pub password: String,

    #[validate(must_match(other = "password", message = "The two password fields didn't match."))]
    pub password_confirm: String,

    #[validate(length(max = 15, message = "Phone must be at most 15 characters."))]
    pub phone: String,

    #[validate(length(max = 255, message = "Address must be at most 255 characters."))]
    pub address: String,
}

fn not_entirely_numeric(password: &str) -> Result<(), ValidationError> {
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("password_entirely_numeric")
            .with_message(Cow::Borrowed("This password is entirely numeric.")));
    }
    Ok(())
}

/// A freshly opened session. `token` goes into the cookie and nowhere else.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Registers users and manages their cookie sessions.
///
/// Session tokens are hashed with HMAC-SHA256 (keyed by `signing_secret`)
/// before storage and lookup, so a database dump alone cannot be replayed as
/// cookies.
pub struct AuthService<U: UserRepository + ?Sized, S: SessionRepository + ?Sized> {
    users: Arc<U>,
    sessions: Arc<S>,
    signing_secret: String,
    session_ttl: Duration,
}

impl<U: UserRepository + ?Sized, S: SessionRepository + ?Sized> AuthService<U, S> {
    pub fn new(users: Arc<U>, sessions: Arc<S>, signing_secret: String, session_ttl: Duration) -> Self {
        Self {
            users,
            sessions,
            signing_secret,
            session_ttl,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Hashes a raw token with HMAC-SHA256 using the server signing secret.
    ///
    /// Returns a 64-character lowercase hex-encoded MAC.
    fn hash_token(&self, token: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn generate_token() -> Result<String, AppError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        getrandom::fill(&mut bytes).map_err(|e| {
            AppError::internal("Failed to generate session token", json!({ "error": e.to_string() }))
        })?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for invalid fields or a taken
    /// username, including one taken between the check and the insert.
    pub async fn register(&self, form: Registration) -> Result<User, AppError> {
        form.validate()?;

        let username = form.username.trim().to_string();
        if self.users.find_by_username(&username).await?.is_some() {
            return Err(AppError::field("username", USERNAME_TAKEN));
        }

        let password_hash = hash_password(&form.password)
            .map_err(|e| AppError::internal("Failed to hash password", json!({ "error": e.to_string() })))?;

        let user = self
            .users
            .create(NewUser {
                username,
                email: form.email.trim().to_string(),
                password_hash,
                phone: form.phone.trim().to_string(),
                address: form.address.trim().to_string(),
            })
            .await
            .map_err(|e| {
                let taken = matches!(e, AppError::Conflict { .. })
                    && e.conflict_constraint()
                        .is_none_or(|constraint| constraint == USERNAME_CONSTRAINT);
                if taken {
                    AppError::field("username", USERNAME_TAKEN)
                } else {
                    e
                }
            })?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");

        Ok(user)
    }

    /// Checks credentials and opens a session.
    ///
    /// Expired sessions of the same user are purged on the way.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginSession, AppError> {
        let Some(user) = self.users.find_by_username(username.trim()).await? else {
            tracing::debug!(username, "Login for unknown user");
            return Err(AppError::field(FORM_FIELD, BAD_CREDENTIALS));
        };

        let valid = verify_password(password, &user.password_hash).map_err(|e| {
            AppError::internal("Stored password hash unreadable", json!({ "user_id": user.id, "error": e.to_string() }))
        })?;
        if !valid {
            tracing::debug!(user_id = user.id, "Login with wrong password");
            return Err(AppError::field(FORM_FIELD, BAD_CREDENTIALS));
        }

        match self.sessions.purge_expired(user.id, now).await {
            Ok(0) => {}
            Ok(purged) => tracing::debug!(user_id = user.id, purged, "Purged expired sessions"),
            Err(e) => tracing::warn!(user_id = user.id, error = %e, "Failed to purge expired sessions"),
        }

        let token = Self::generate_token()?;
        let expires_at = now.checked_add_signed(self.session_ttl).ok_or_else(|| {
            AppError::internal(
                "Session lifetime is out of range",
                json!({ "session_ttl_secs": self.session_ttl.num_seconds() }),
            )
        })?;
        self.sessions
            .create(user.id, &self.hash_token(&token), expires_at)
            .await?;

        tracing::info!(user_id = user.id, "User logged in");

        Ok(LoginSession {
            user,
            token,
            expires_at,
        })
    }

    /// Resolves a cookie token to its user, if the session is still active.
    pub async fn authenticate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CurrentUser>, AppError> {
        let Some(session) = self.sessions.find_active(&self.hash_token(token), now).await? else {
            return Ok(None);
        };

        let user = self.users.find_by_id(session.user_id).await?;
        Ok(user.as_ref().map(CurrentUser::from))
    }

    /// Ends the session behind `token`. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        let token_hash = self.hash_token(token);

        if let Some(session) = self.sessions.find_active(&token_hash, now).await? {
            self.sessions.purge_expired(session.user_id, now).await?;
            tracing::info!(user_id = session.user_id, "User logged out");
        }

        self.sessions.delete(&token_hash).await
    }
}
