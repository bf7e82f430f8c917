//! Axum middleware stack.

pub mod bruteforce;
pub mod logging;
