//! Best-effort system metric sampling.
//!
//! Readings are `Option`s: a platform where `sysinfo` cannot see CPU or
//! memory data yields `None` and callers carry on without throttling.

use serde::Serialize;
use sysinfo::{System, MINIMUM_CPU_UPDATE_INTERVAL};

/// Samples system-wide CPU and memory figures.
pub trait SystemProbe: Send {
    /// Global CPU utilisation in percent since the previous call.
    fn cpu_usage(&mut self) -> Option<f32>;

    /// Total physical memory in bytes.
    fn total_memory(&mut self) -> Option<u64>;
}

/// [`SystemProbe`] backed by `sysinfo`.
pub struct SysinfoProbe {
    system: System,
    primed: bool,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            primed: false,
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProbe for SysinfoProbe {
    fn cpu_usage(&mut self) -> Option<f32> {
        self.system.refresh_cpu_usage();
        // The first refresh only establishes a baseline.
        if !self.primed {
            self.primed = true;
            return None;
        }
        if self.system.cpus().is_empty() {
            return None;
        }
        let usage = self.system.global_cpu_usage();
        usage.is_finite().then_some(usage)
    }

    fn total_memory(&mut self) -> Option<u64> {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        (total > 0).then_some(total)
    }
}

/// Snapshot served by `/system-info`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SystemInfo {
    pub cpu_cores: usize,
    pub cpu_usage_percent: f64,
    pub total_memory_gb: f64,
    pub available_memory_gb: f64,
    pub memory_usage_percent: f64,
}

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Sample CPU and memory. Blocks for the minimum CPU sampling interval, so
/// call it from a blocking context.
pub fn sample_system_info() -> SystemInfo {
    let mut system = System::new();
    system.refresh_cpu_usage();
    std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
    system.refresh_cpu_usage();
    system.refresh_memory();

    let cpu_cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or_else(|_| system.cpus().len().max(1));
    let total = system.total_memory() as f64;
    let available = system.available_memory() as f64;
    let used_percent = if total > 0.0 {
        (total - available) / total * 100.0
    } else {
        0.0
    };
    let cpu_usage = system.global_cpu_usage() as f64;

    SystemInfo {
        cpu_cores,
        cpu_usage_percent: round2(if cpu_usage.is_finite() { cpu_usage } else { 0.0 }),
        total_memory_gb: round2(total / GIB),
        available_memory_gb: round2(available / GIB),
        memory_usage_percent: round2(used_percent),
    }
}
