//! HTML page handlers.

mod auth;
mod home;
mod shorts;

pub use auth::{login_page, login_submit, logout_submit, register_page, register_submit};
pub use home::home_handler;
pub use shorts::{
    create_page, create_submit, delete_page, delete_submit, edit_page, edit_submit, list_handler,
    regenerate_page, regenerate_submit, stats_handler,
};
