//! Custom Axum extractors.

pub mod auth;
pub mod client_ip;
pub mod json;

pub use auth::{AuthUser, SESSION_COOKIE};
pub use client_ip::ClientIp;
pub use json::{ApiJson, ValidatedJson};
