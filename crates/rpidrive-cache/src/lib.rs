//! # rpidrive-cache
//!
//! Key-value store implementations for RPi Drive. Two backends:
//!
//! - **memory**: in-process store using [moka](https://crates.io/crates/moka)
//! - **redis**: Redis-backed store using the [redis](https://crates.io/crates/redis) crate
//!
//! The backend is selected at runtime from `redis.enabled`. On top of it sit
//! the session store, the brute-force counters and the [`EntityCache`].

pub mod entity;
pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use entity::{CachedEntity, EntityCache};
pub use provider::CacheManager;
