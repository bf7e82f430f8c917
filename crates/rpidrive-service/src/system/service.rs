//! CPU, memory, disk and network figures of the host.

use std::time::Duration;

use serde::Serialize;
use sysinfo::{Networks, System};

use rpidrive_core::error::{AppError, ErrorKind};
use rpidrive_core::result::AppResult;
use rpidrive_storage::disk::{self, DiskInfo};

use crate::context::RequestContext;

/// Gap between the two CPU samples needed for a usage figure.
const CPU_SAMPLE_GAP: Duration = Duration::from_millis(250);
/// Window over which network speed is measured.
const NETWORK_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Serialize)]
pub struct CpuInfo {
    pub brand: String,
    pub cores: usize,
    /// Percent over all cores.
    pub usage: f32,
    /// MHz.
    pub frequency: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryInfo {
    pub total: u64,
    pub used: u64,
    pub available: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentInfo {
    pub os: String,
    pub kernel: String,
    pub hostname: String,
    /// Seconds.
    pub uptime: u64,
    pub version: &'static str,
    pub time_zone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemDetails {
    pub cpu: CpuInfo,
    pub memory: MemoryInfo,
    pub disks: Vec<DiskInfo>,
    pub environment: EnvironmentInfo,
}

/// Bytes per second over the sample window, and totals since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    pub download_speed: u64,
    pub upload_speed: u64,
    pub downloads: u64,
    pub uploads: u64,
}

/// Host probes for the admin dashboard.
#[derive(Debug, Clone)]
pub struct SystemService {
    time_zone: String,
}

fn blocking_error(e: tokio::task::JoinError) -> AppError {
    AppError::with_source(ErrorKind::Internal, "System probe panicked", e)
}

impl SystemService {
    /// Creates a new system service reporting `time_zone`.
    pub fn new(time_zone: impl Into<String>) -> Self {
        Self {
            time_zone: time_zone.into(),
        }
    }

    /// CPU, memory, disks and OS details. Superuser only.
    pub async fn details(&self, ctx: &RequestContext) -> AppResult<SystemDetails> {
        ctx.require_superuser()?;
        let time_zone = self.time_zone.clone();
        tokio::task::spawn_blocking(move || probe_details(time_zone))
            .await
            .map_err(blocking_error)
    }

    /// Network throughput sampled over one second. Superuser only.
    pub async fn network(&self, ctx: &RequestContext) -> AppResult<NetworkStats> {
        ctx.require_superuser()?;
        let mut networks = tokio::task::spawn_blocking(Networks::new_with_refreshed_list)
            .await
            .map_err(blocking_error)?;
        tokio::time::sleep(NETWORK_SAMPLE_WINDOW).await;
        tokio::task::spawn_blocking(move || {
            networks.refresh();
            sum_networks(&networks)
        })
        .await
        .map_err(blocking_error)
    }
}

fn probe_details(time_zone: String) -> SystemDetails {
    let mut sys = System::new();
    sys.refresh_cpu();
    std::thread::sleep(CPU_SAMPLE_GAP);
    sys.refresh_cpu();
    sys.refresh_memory();

    let cpus = sys.cpus();
    let cpu = CpuInfo {
        brand: cpus
            .first()
            .map(|c| c.brand().trim().to_string())
            .unwrap_or_default(),
        cores: cpus.len(),
        usage: sys.global_cpu_info().cpu_usage(),
        frequency: cpus.first().map(|c| c.frequency()).unwrap_or_default(),
    };
    let memory = MemoryInfo {
        total: sys.total_memory(),
        used: sys.used_memory(),
        available: sys.available_memory(),
    };
    let environment = EnvironmentInfo {
        os: System::long_os_version()
            .or_else(System::name)
            .unwrap_or_default(),
        kernel: System::kernel_version().unwrap_or_default(),
        hostname: System::host_name().unwrap_or_default(),
        uptime: System::uptime(),
        version: env!("CARGO_PKG_VERSION"),
        time_zone,
    };

    SystemDetails {
        cpu,
        memory,
        disks: disk::list_disks(),
        environment,
    }
}

fn sum_networks(networks: &Networks) -> NetworkStats {
    let window = NETWORK_SAMPLE_WINDOW.as_secs().max(1);
    let mut stats = NetworkStats::default();
    for (_, data) in networks.iter() {
        stats.download_speed += data.received();
        stats.upload_speed += data.transmitted();
        stats.downloads += data.total_received();
        stats.uploads += data.total_transmitted();
    }
    stats.download_speed /= window;
    stats.upload_speed /= window;
    stats
}
