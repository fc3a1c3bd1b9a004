//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated
//! via `mockall` for unit tests.
//!
//! - [`ShortLinkRepository`] - Short link storage, key lookups and click counting
//! - [`UserRepository`] - User accounts
//! - [`SessionRepository`] - Login sessions

pub mod session_repository;
pub mod short_link_repository;
pub mod user_repository;

pub use session_repository::SessionRepository;
pub use short_link_repository::ShortLinkRepository;
pub use user_repository::UserRepository;

#[cfg(test)]
pub use session_repository::MockSessionRepository;
#[cfg(test)]
pub use short_link_repository::MockShortLinkRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
