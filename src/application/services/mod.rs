//! Business logic services for the application layer.

pub mod auth_service;
pub mod key_generator;
pub mod redirect_service;
pub mod short_link_service;

pub use auth_service::{AuthService, LoginSession, Registration};
pub use key_generator::KeyGenerator;
pub use redirect_service::{RedirectService, ResolveError};
pub use short_link_service::{ShortLinkInput, ShortLinkService};
