//! Helper functions used across the application.
//!
//! - [`base62`] - Base62 encoding and random suffixes
//! - [`alias`] - Custom alias rules
//! - [`url_normalizer`] - Destination URL validation
//! - [`password`] - Argon2id password hashing
//! - [`qr`] - QR code rendering
//! - [`request_origin`] - Absolute origin of the running site
//! - [`db_error`] - Store conflict classification
//! - [`datetime`] - `datetime-local` form values

pub mod alias;
pub mod base62;
pub mod datetime;
pub mod db_error;
pub mod password;
pub mod qr;
pub mod request_origin;
pub mod url_normalizer;
