//! Core domain entities.
//!
//! - [`ShortLink`] - An alias redirecting to a destination URL
//! - [`User`] - A registered account owning links
//! - [`Session`] - A login session keyed by a hashed cookie token
//!
//! Creation inputs live in separate structs (`NewShortLink`, `NewUser`).

pub mod short_link;
pub mod user;

pub use short_link::{NewShortLink, ShortLink, ShortLinkPatch};
pub use user::{CurrentUser, NewUser, Session, User};
