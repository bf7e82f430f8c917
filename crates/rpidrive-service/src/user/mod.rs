//! User accounts and login.

pub mod service;

pub use service::{CreateUserRequest, INVALID_CREDENTIALS, UpdateUserRequest, UserService};
