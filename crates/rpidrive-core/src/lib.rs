//! # rpidrive-core
//!
//! Core crate for RPi Drive. Contains the configuration schema, the unified
//! error system, process logging setup and the cache provider trait
//! implemented by `rpidrive-cache`.
//!
//! This crate has **no** internal dependencies on other RPi Drive crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod result;
pub mod traits;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
