//! # rpidrive-entity
//!
//! Domain entity models for RPi Drive. Every struct in this crate
//! represents a database table row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and database
//! entities additionally derive `sqlx::FromRow`.

pub mod activity;
pub mod file;
pub mod job;
pub mod playlist;
pub mod share;
pub mod user;
pub mod volume;
