//! # rpidrive-api
//!
//! HTTP API layer for RPi Drive built on Axum.
//!
//! Provides the `/ui-api` JSON endpoints, range-aware downloads, the
//! quick-access link surface, session extraction, the login brute-force
//! guard and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
