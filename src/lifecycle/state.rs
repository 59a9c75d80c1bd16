//! Process lifecycle state machine.
//!
//! # States
//! ```text
//! Running ──signal──▶ Draining ──drain done / deadline──▶ Stopped
//! ```
//!
//! The `terminating` flag flips false → true exactly once and is never
//! reset. The readiness probe reads it; only the server's shutdown path
//! writes it.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// Lifecycle phase of the server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting connections; readiness reports healthy.
    Running,
    /// Refusing new connections, finishing in-flight requests.
    Draining,
    /// Listener closed.
    Stopped,
}

/// Process-wide lifecycle state shared by the server and the probes.
#[derive(Debug)]
pub struct Lifecycle {
    terminating: AtomicBool,
    phase: watch::Sender<Phase>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (phase, _) = watch::channel(Phase::Running);
        Self {
            terminating: AtomicBool::new(false),
            phase,
        }
    }

    /// Whether a termination signal has been received.
    pub fn is_terminating(&self) -> bool {
        self.terminating.load(Ordering::Acquire)
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Enter `Draining`.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn begin_draining(&self) -> bool {
        let first = self
            .terminating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if first {
            self.phase.send_if_modified(|phase| {
                if *phase == Phase::Running {
                    *phase = Phase::Draining;
                    true
                } else {
                    false
                }
            });
        }
        first
    }

    /// Enter `Stopped`. The terminating flag is left untouched.
    pub fn mark_stopped(&self) {
        self.phase.send_replace(Phase::Stopped);
    }

    /// Subscribe to phase changes.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Resolve once the process has left `Running`.
    pub async fn draining(&self) {
        let mut rx = self.phase.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|phase| *phase != Phase::Running).await;
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
