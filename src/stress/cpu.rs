//! CPU stress workers.
//!
//! Each worker alternates between one busy slice and a utilisation sample.
//! When the system is already at or above the target it sleeps for a slice
//! instead of spinning. This is a best-effort throttle, not a scheduler.

use std::time::{Duration, Instant};

use sysinfo::MINIMUM_CPU_UPDATE_INTERVAL;

use crate::stress::probe::SystemProbe;

/// Length of one busy or idle slice.
pub const SLICE: Duration = Duration::from_millis(100);

/// Shortest gap between two CPU samples. Shorter gaps give noisy readings,
/// so the previous reading is reused until it has passed.
pub const SAMPLE_INTERVAL: Duration = MINIMUM_CPU_UPDATE_INTERVAL;

/// Number of workers needed to reach `percent` across `cores` cores.
pub fn worker_count(cores: usize, percent: u8) -> usize {
    let cores = cores.max(1);
    let wanted = (cores * percent as usize).div_ceil(100);
    wanted.max(1)
}

/// What a worker did during one slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceAction {
    Spin,
    Backoff,
}

/// Decide the next slice from the latest reading. No reading means spin.
pub fn next_action(observed: Option<f32>, target_percent: u8) -> SliceAction {
    match observed {
        Some(usage) if usage >= target_percent as f32 => SliceAction::Backoff,
        _ => SliceAction::Spin,
    }
}

/// Spin for roughly `slice`, returning the number of iterations performed.
fn spin(slice: Duration) -> u64 {
    let start = Instant::now();
    let mut iterations: u64 = 0;
    while start.elapsed() < slice {
        iterations = std::hint::black_box(iterations.wrapping_add(1));
    }
    iterations
}

/// Run one worker until `duration` has elapsed. Blocking.
///
/// Returns how many slices were spent spinning and backing off.
pub fn run_worker<P: SystemProbe>(
    probe: &mut P,
    target_percent: u8,
    duration: Duration,
) -> (u32, u32) {
    run_worker_sampling(probe, target_percent, duration, SAMPLE_INTERVAL)
}

fn run_worker_sampling<P: SystemProbe>(
    probe: &mut P,
    target_percent: u8,
    duration: Duration,
    sample_every: Duration,
) -> (u32, u32) {
    let deadline = Instant::now() + duration;
    let mut spun = 0;
    let mut backed_off = 0;
    let mut observed = probe.cpu_usage();
    let mut sampled_at = Instant::now();

    while Instant::now() < deadline {
        let slice = SLICE.min(deadline.saturating_duration_since(Instant::now()));
        match next_action(observed, target_percent) {
            SliceAction::Spin => {
                spin(slice);
                spun += 1;
            }
            SliceAction::Backoff => {
                std::thread::sleep(slice);
                backed_off += 1;
            }
        }
        if sampled_at.elapsed() >= sample_every {
            observed = probe.cpu_usage();
            sampled_at = Instant::now();
        }
    }

    (spun, backed_off)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe(Option<f32>);

    impl SystemProbe for FixedProbe {
        fn cpu_usage(&mut self) -> Option<f32> {
            self.0
        }

        fn total_memory(&mut self) -> Option<u64> {
            None
        }
    }

    #[test]
    fn worker_count_scales_with_cores() {
        assert_eq!(worker_count(8, 50), 4);
        assert_eq!(worker_count(8, 100), 8);
        assert_eq!(worker_count(8, 10), 1);
        assert_eq!(worker_count(4, 0), 1);
        assert_eq!(worker_count(0, 100), 1);
        assert_eq!(worker_count(3, 50), 2);
    }

    #[test]
    fn backs_off_at_or_above_target() {
        assert_eq!(next_action(Some(80.0), 50), SliceAction::Backoff);
        assert_eq!(next_action(Some(50.0), 50), SliceAction::Backoff);
        assert_eq!(next_action(Some(10.0), 50), SliceAction::Spin);
        assert_eq!(next_action(None, 50), SliceAction::Spin);
        assert_eq!(next_action(Some(0.0), 0), SliceAction::Backoff);
    }

    #[test]
    fn missing_readings_degrade_to_busy_work() {
        let mut probe = FixedProbe(None);
        let (spun, backed_off) = run_worker(&mut probe, 30, Duration::from_millis(250));
        assert!(spun >= 2);
        assert_eq!(backed_off, 0);
    }

    #[test]
    fn saturated_system_only_sleeps() {
        let mut probe = FixedProbe(Some(99.0));
        let start = Instant::now();
        let (spun, backed_off) = run_worker(&mut probe, 20, Duration::from_millis(250));
        assert_eq!(spun, 0);
        assert!(backed_off >= 2);
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    struct CountingProbe(u32);

    impl SystemProbe for CountingProbe {
        fn cpu_usage(&mut self) -> Option<f32> {
            self.0 += 1;
            None
        }

        fn total_memory(&mut self) -> Option<u64> {
            None
        }
    }

    #[test]
    fn samples_no_faster_than_the_interval() {
        let mut probe = CountingProbe(0);
        let (spun, _) =
            run_worker_sampling(&mut probe, 50, Duration::from_millis(600), Duration::from_millis(250));
        assert!(spun >= 6);
        // One baseline sample, then at most one per 250ms of the 600ms run.
        assert!(probe.0 <= 3, "sampled {} times", probe.0);
        assert!(probe.0 >= 2);
    }

    #[test]
    fn zero_duration_returns_immediately() {
        let mut probe = FixedProbe(None);
        assert_eq!(run_worker(&mut probe, 50, Duration::ZERO), (0, 0));
    }
}
