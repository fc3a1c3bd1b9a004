//! Repository implementations.
//!
//! # Repositories
//!
//! - [`PgShortLinkRepository`] - Short links on PostgreSQL
//! - [`PgUserRepository`] - User accounts on PostgreSQL
//! - [`PgSessionRepository`] - Login sessions on PostgreSQL
//! - [`InMemoryStore`] - All three traits in process memory

pub mod memory;
pub mod pg_session_repository;
pub mod pg_short_link_repository;
pub mod pg_user_repository;

pub use memory::InMemoryStore;
pub use pg_session_repository::PgSessionRepository;
pub use pg_short_link_repository::PgShortLinkRepository;
pub use pg_user_repository::PgUserRepository;
