//! HTTP route handlers grouped by page area.
//!
//! Auth form submissions live in [`crate::auth::routes`]; everything the
//! browser GETs as a page is here, plus the status catchers.

pub mod admin;
pub mod catchers;
pub mod health;
pub mod pages;
