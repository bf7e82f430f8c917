//! Host machine probes.

pub mod service;

pub use service::{CpuInfo, EnvironmentInfo, MemoryInfo, NetworkStats, SystemDetails, SystemService};
