//! Per-volume authorization.

pub mod resolver;

pub use resolver::{PermissionResolver, effective_permission};
