//! Public machine-facing endpoints.
//!
//! # Modules
//!
//! - [`dto`] - JSON response types
//! - [`handlers`] - Redirect and health handlers
//! - [`middleware`] - Request tracing

pub mod dto;
pub mod handlers;
pub mod middleware;
