//! # rpidrive-database
//!
//! PostgreSQL connection management and concrete repository
//! implementations for all RPi Drive entities.

pub mod connection;
pub mod error;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use sqlx::PgPool;
