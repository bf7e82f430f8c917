//! Login sessions.

pub mod manager;

pub use manager::{SessionManager, SessionToken};
