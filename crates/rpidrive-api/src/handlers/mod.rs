//! Request handlers, one module per resource.

pub mod auth;
pub mod download;
pub mod file;
pub mod job;
pub mod playlist;
pub mod system;
pub mod user;
pub mod volume;
