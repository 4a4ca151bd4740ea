//! Cooperative stop and pause signals for long-running operations.
//!
//! Every scan, duplicate search, and hash computation receives a
//! [`ScanControl`] and consults it at each unit of work (one file, one
//! chunk). Two signals are carried:
//!
//! - **stop**: an `AtomicBool` that only goes from `false` to `true` during a
//!   run. Once observed, the operation ends cleanly, without an error.
//! - **pause**: a gate built on a `Mutex<bool>` + `Condvar`. While closed,
//!   workers block without spinning until [`ScanControl::resume`] is called.
//!
//! Requesting a stop also releases any paused worker, so a paused scan can
//! always be cancelled.
//!
//! # Example
//!
//! ```
//! use cleanup_lite::control::ScanControl;
//!
//! let control = ScanControl::new();
//! let worker_control = control.clone();
//!
//! let worker = std::thread::spawn(move || {
//!     let mut processed = 0;
//!     while worker_control.checkpoint() && processed < 10 {
//!         processed += 1;
//!     }
//!     processed
//! });
//!
//! assert_eq!(worker.join().unwrap(), 10);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Pause gate shared between the controller and the workers.
#[derive(Debug, Default)]
struct PauseGate {
    paused: Mutex<bool>,
    resumed: Condvar,
}

impl PauseGate {
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.paused.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Shared stop/pause handle for one active operation.
///
/// Cloning is cheap and every clone observes the same signals.
///
/// # Thread Safety
///
/// `ScanControl` is `Send` and `Sync`. The stop flag uses `SeqCst` atomics;
/// the pause state is guarded by a mutex.
#[derive(Debug, Clone, Default)]
pub struct ScanControl {
    stop: Arc<AtomicBool>,
    gate: Arc<PauseGate>,
}

impl ScanControl {
    /// Create a handle with no stop requested and not paused.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a handle around an existing stop flag.
    ///
    /// Used by the signal handler so Ctrl+C and the control share one flag.
    #[must_use]
    pub fn with_stop_flag(flag: Arc<AtomicBool>) -> Self {
        Self {
            stop: flag,
            gate: Arc::new(PauseGate::default()),
        }
    }

    /// Request that every operation using this handle stops.
    ///
    /// Also wakes any worker blocked on the pause gate.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        // Take the lock so a worker between its stop check and its wait
        // cannot miss the notification.
        let _guard = self.gate.lock();
        self.gate.resumed.notify_all();
        log::debug!("Stop requested");
    }

    /// Check if a stop has been requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Get a clone of the raw stop flag.
    #[must_use]
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Close the pause gate. Workers block at their next checkpoint.
    pub fn pause(&self) {
        *self.gate.lock() = true;
        log::debug!("Paused");
    }

    /// Open the pause gate and wake all blocked workers.
    pub fn resume(&self) {
        *self.gate.lock() = false;
        self.gate.resumed.notify_all();
        log::debug!("Resumed");
    }

    /// Flip the pause state. Returns `true` if the handle is now paused.
    pub fn toggle_pause(&self) -> bool {
        let mut paused = self.gate.lock();
        *paused = !*paused;
        let now_paused = *paused;
        drop(paused);

        if !now_paused {
            self.gate.resumed.notify_all();
        }
        now_paused
    }

    /// Check if the pause gate is closed.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        *self.gate.lock()
    }

    /// Block while paused. Returns immediately once a stop is requested.
    pub fn wait_while_paused(&self) {
        let mut paused = self.gate.lock();
        while *paused && !self.is_stop_requested() {
            paused = self
                .gate
                .resumed
                .wait(paused)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Wait out a pause, then report whether work may continue.
    ///
    /// Returns `false` when a stop has been requested.
    #[must_use]
    pub fn checkpoint(&self) -> bool {
        if self.is_stop_requested() {
            return false;
        }
        self.wait_while_paused();
        !self.is_stop_requested()
    }

    /// Clear both signals before starting a new run.
    pub fn reset(&self) {
        self.stop.store(false, Ordering::SeqCst);
        self.resume();
    }
}
