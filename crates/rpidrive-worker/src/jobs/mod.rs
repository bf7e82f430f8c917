//! Jobs run on every worker tick besides indexing.

pub mod cleanup;
pub mod zip;

pub use cleanup::LinkCleanup;
pub use zip::ZipJobHandler;
