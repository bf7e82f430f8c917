//! Traits defined in `rpidrive-core` and implemented by other crates.

pub mod cache;

pub use cache::CacheProvider;
