//! Synthetic resource stress.
//!
//! # Data Flow
//! ```text
//! /stress/{cpu,memory}?..._percent=N&duration=D
//!     → params.rs (validate; reject before anything starts)
//!     → StressLauncher::launch (fire-and-forget)
//!         cpu:    N detached worker threads (cpu.rs), throttled by probe.rs
//!         memory: one task holding a resident buffer (memory.rs)
//! ```
//!
//! Jobs have no handle and no cancellation; they always run for the full
//! duration. Each job is its own task, so a failing job cannot affect others.

pub mod cpu;
pub mod memory;
pub mod params;
pub mod probe;

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::oneshot;

pub use params::{StressError, StressKind, StressParams};
pub use probe::{sample_system_info, SysinfoProbe, SystemInfo, SystemProbe};

use crate::observability::metrics;

/// Starts stress jobs and counts them.
#[derive(Debug)]
pub struct StressLauncher {
    started: AtomicU64,
    cores: usize,
}

impl StressLauncher {
    pub fn new() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            started: AtomicU64::new(0),
            cores,
        }
    }

    /// Jobs started since process start.
    pub fn jobs_started(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }

    /// Detach a job for `params`. Must be called from within a Tokio runtime.
    pub fn launch(&self, params: StressParams) {
        self.started.fetch_add(1, Ordering::Relaxed);
        metrics::record_stress_job(params.kind.as_str());

        match params.kind {
            StressKind::Cpu => self.launch_cpu(params),
            StressKind::Memory => launch_memory(params),
        }
    }

    fn launch_cpu(&self, params: StressParams) {
        let workers = cpu::worker_count(self.cores, params.percent);
        tracing::info!(
            percent = params.percent,
            duration_secs = params.duration_secs,
            workers,
            "CPU stress started"
        );

        // Detached OS threads, not the blocking pool: runtime shutdown must
        // not wait for a job to run out its duration.
        let results: Vec<_> = (0..workers)
            .filter_map(|index| {
                let (tx, rx) = oneshot::channel();
                let spawned = std::thread::Builder::new()
                    .name(format!("cpu-stress-{}", index))
                    .spawn(move || {
                        let mut probe = SysinfoProbe::new();
                        let _ = tx.send(cpu::run_worker(&mut probe, params.percent, params.duration()));
                    });
                match spawned {
                    Ok(_) => Some(rx),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to spawn CPU stress worker");
                        None
                    }
                }
            })
            .collect();

        tokio::spawn(async move {
            let (mut spun, mut backed_off) = (0u32, 0u32);
            for result in results {
                match result.await {
                    Ok((s, b)) => {
                        spun += s;
                        backed_off += b;
                    }
                    Err(e) => tracing::error!(error = %e, "CPU stress worker failed"),
                }
            }
            tracing::info!(
                percent = params.percent,
                spun_slices = spun,
                backoff_slices = backed_off,
                "CPU stress finished"
            );
        });
    }
}

impl Default for StressLauncher {
    fn default() -> Self {
        Self::new()
    }
}

fn launch_memory(params: StressParams) {
    tokio::spawn(async move {
        let Some(total) = SysinfoProbe::new().total_memory() else {
            tracing::warn!("Total memory unknown, memory stress skipped");
            return;
        };
        let bytes = memory::bytes_for_percent(total, params.percent);
        tracing::info!(
            percent = params.percent,
            duration_secs = params.duration_secs,
            bytes,
            "Memory stress started"
        );

        match memory::hold(bytes, params.duration()).await {
            Ok(held) => tracing::info!(bytes = held, "Memory stress finished, buffer released"),
            Err(e) => tracing::error!(error = %e, "Memory stress failed"),
        }
    });
}
