//! Shared continue/cancel signal between one orchestrator run and its
//! watchdog.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The "continue?" flag for exactly one validation run.
///
/// Clones share the flag. The watchdog is the only writer, revoking the
/// run when the timeout wins; the orchestrator reads the flag exactly
/// once before each terminal state write, never in a loop.
#[derive(Debug, Clone)]
pub struct ExecutionHandle {
    keep_going: Arc<AtomicBool>,
}

impl ExecutionHandle {
    pub fn new() -> Self {
        Self {
            keep_going: Arc::new(AtomicBool::new(true)),
        }
    }

    /// True until the watchdog revokes the run.
    pub fn should_continue(&self) -> bool {
        self.keep_going.load(Ordering::Acquire)
    }

    /// Revoke the run; any late result must be discarded.
    pub fn revoke(&self) {
        self.keep_going.store(false, Ordering::Release);
    }
}

impl Default for ExecutionHandle {
    fn default() -> Self {
        Self::new()
    }
}
