//! Run status and cooperative stop
//!
//! A report checks [`StatusFlag::is_stopped`] between result rows and leaves
//! its row loop as soon as the flag flips. Nothing is rolled back; whatever was
//! written so far stays in the workbook.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Lifecycle of one report run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Running,
    Stopped,
    Complete,
    Failed,
}

impl RunStatus {
    fn to_u8(self) -> u8 {
        match self {
            RunStatus::Idle => 0,
            RunStatus::Running => 1,
            RunStatus::Stopped => 2,
            RunStatus::Complete => 3,
            RunStatus::Failed => 4,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => RunStatus::Running,
            2 => RunStatus::Stopped,
            3 => RunStatus::Complete,
            4 => RunStatus::Failed,
            _ => RunStatus::Idle,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Idle => write!(f, "idle"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Stopped => write!(f, "stopped"),
            RunStatus::Complete => write!(f, "complete"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug)]
struct StatusCell {
    status: AtomicU8,
    stop_requested: AtomicBool,
}

/// Shared status cell; clones observe and update the same value
///
/// A stop requested between runs stays pending until the next run starts,
/// which then ends at once as stopped. [`StatusFlag::finish`] clears it.
#[derive(Debug, Clone)]
pub struct StatusFlag {
    inner: Arc<StatusCell>,
}

impl StatusFlag {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StatusCell {
                status: AtomicU8::new(RunStatus::Idle.to_u8()),
                stop_requested: AtomicBool::new(false),
            }),
        }
    }

    pub fn get(&self) -> RunStatus {
        RunStatus::from_u8(self.inner.status.load(Ordering::SeqCst))
    }

    pub fn set(&self, status: RunStatus) {
        self.inner.status.store(status.to_u8(), Ordering::SeqCst);
    }

    /// Ask the running report to stop at its next row, or the next report
    /// to stop before it starts
    pub fn stop(&self) {
        self.inner.stop_requested.store(true, Ordering::SeqCst);
        self.set(RunStatus::Stopped);
    }

    pub fn is_stopped(&self) -> bool {
        self.get() == RunStatus::Stopped
    }

    /// Mark a run as started. Returns `false` when a stop is already pending.
    pub fn start(&self) -> bool {
        if self.inner.stop_requested.load(Ordering::SeqCst) {
            self.set(RunStatus::Stopped);
            return false;
        }
        self.set(RunStatus::Running);
        true
    }

    /// Record the final status of a run and drop any stop request
    pub fn finish(&self, status: RunStatus) {
        self.inner.stop_requested.store(false, Ordering::SeqCst);
        self.set(status);
    }
}

impl Default for StatusFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let flag = StatusFlag::new();
        let handle = flag.clone();
        assert_eq!(flag.get(), RunStatus::Idle);

        flag.set(RunStatus::Running);
        assert_eq!(handle.get(), RunStatus::Running);

        handle.stop();
        assert!(flag.is_stopped());
    }

    #[test]
    fn test_stop_from_other_thread() {
        let flag = StatusFlag::new();
        flag.set(RunStatus::Running);
        let handle = flag.clone();
        std::thread::spawn(move || handle.stop()).join().unwrap();
        assert_eq!(flag.get(), RunStatus::Stopped);
    }

    #[test]
    fn test_stop_between_runs_stays_pending() {
        let flag = StatusFlag::new();
        flag.clone().stop();
        assert!(!flag.start());
        assert!(flag.is_stopped());

        flag.finish(RunStatus::Stopped);
        assert!(flag.start());
        assert_eq!(flag.get(), RunStatus::Running);

        // a stop during the run ends with that run
        flag.stop();
        flag.finish(RunStatus::Stopped);
        assert!(flag.start());
    }

    #[test]
    fn test_status_round_trip_all_variants() {
        for status in [
            RunStatus::Idle,
            RunStatus::Running,
            RunStatus::Stopped,
            RunStatus::Complete,
            RunStatus::Failed,
        ] {
            assert_eq!(RunStatus::from_u8(status.to_u8()), status);
        }
    }
}
