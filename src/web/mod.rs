//! Browser-facing HTML pages.
//!
//! Uses Askama templates for server-side rendering.
//!
//! # Modules
//!
//! - [`forms`] - Posted form payloads
//! - [`handlers`] - Page handlers
//! - [`middleware`] - Session authentication
//! - [`routes`] - Page route configuration
//! - [`session`] - Session cookie helpers and the optional-user extractor

pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod session;
