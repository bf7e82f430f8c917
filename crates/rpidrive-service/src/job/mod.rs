//! Job listing and cancellation.

pub mod service;

pub use service::JobService;
