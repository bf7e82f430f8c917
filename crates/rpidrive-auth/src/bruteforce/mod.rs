//! Per-address login throttling.

pub mod guard;

pub use guard::{BLOCKED_MESSAGE, BruteForceGuard};
