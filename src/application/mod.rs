//! Application layer services implementing business logic.
//!
//! Services consume repository traits and expose the operations HTTP handlers
//! call.
//!
//! - [`services::KeyGenerator`] - Default, custom and regenerated keys
//! - [`services::ShortLinkService`] - Owner-scoped link management
//! - [`services::RedirectService`] - Key resolution and click counting
//! - [`services::AuthService`] - Accounts and login sessions
//! - [`access`] - Owner checks

pub mod access;
pub mod services;
