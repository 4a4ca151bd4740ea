//! Signal handling for graceful shutdown.
//!
//! Ctrl+C (and SIGTERM/SIGHUP with the `termination` feature) is routed into
//! the process-wide [`ScanControl`]. Setting its stop signal ends any running
//! scan at the next file or chunk boundary and also releases a paused scan.
//!
//! # Usage
//!
//! ```rust,no_run
//! use cleanup_lite::signal::install_handler;
//!
//! let control = install_handler().expect("Failed to install signal handler");
//!
//! // Pass `control.clone()` to Walker, DuplicateFinder, Hasher, ...
//! if control.is_stop_requested() {
//!     println!("Interrupted, cleaning up...");
//! }
//! ```
//!
//! # Exit Codes
//!
//! When a signal is received the application should exit with code 130
//! (128 + SIGINT).

use std::io::Write;
use std::sync::OnceLock;

use crate::control::ScanControl;

/// Exit code for SIGINT (Ctrl+C) interruption.
/// This follows Unix convention: 128 + signal number (SIGINT = 2).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_CONTROL: OnceLock<ScanControl> = OnceLock::new();

/// Install a Ctrl+C handler that requests a stop on interrupt.
///
/// Call once, early in startup. Calling it again returns the already
/// installed handle after resetting it, so tests and repeated runs in one
/// process do not fight over the OS handler.
///
/// # Errors
///
/// Never fails in practice: if the OS handler is already owned by someone
/// else, an unhooked control is returned instead. The `Result` is kept so
/// callers treat installation as fallible.
pub fn install_handler() -> Result<ScanControl, SignalError> {
    if let Some(control) = GLOBAL_CONTROL.get() {
        control.reset();
        return Ok(control.clone());
    }

    let control = ScanControl::new();
    let hooked = control.clone();

    match ctrlc::set_handler(move || {
        hooked.request_stop();

        let _ = writeln!(std::io::stderr(), "\nInterrupted. Cleaning up...");
        let _ = std::io::stderr().flush();

        log::info!("Shutdown signal received");
    }) {
        Ok(()) => {
            let _ = GLOBAL_CONTROL.set(control.clone());
            Ok(control)
        }
        Err(e) => {
            if let Some(existing) = GLOBAL_CONTROL.get() {
                existing.reset();
                Ok(existing.clone())
            } else {
                log::debug!("Ctrl+C handler already registered ({e}), using unhooked control");
                let fallback = ScanControl::new();
                let _ = GLOBAL_CONTROL.set(fallback.clone());
                Ok(fallback)
            }
        }
    }
}

/// Create a control without installing any signal hooks.
///
/// ```
/// use cleanup_lite::signal::create_control;
/// let control = create_control();
/// assert!(!control.is_stop_requested());
/// ```
#[must_use]
pub fn create_control() -> ScanControl {
    ScanControl::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_control() {
        let control = create_control();
        assert!(!control.is_stop_requested());
        assert!(!control.is_paused());
    }

    #[test]
    fn test_install_handler_is_reusable() {
        let first = install_handler().unwrap();
        first.request_stop();

        let second = install_handler().unwrap();
        assert!(!second.is_stop_requested(), "reinstall should reset the control");
        assert!(!first.is_stop_requested(), "both handles share one flag");
    }

    #[test]
    fn test_exit_code_interrupted() {
        assert_eq!(EXIT_CODE_INTERRUPTED, 130);
    }

    #[test]
    fn test_signal_error_display() {
        fn assert_display<T: std::fmt::Display>() {}
        assert_display::<SignalError>();
    }
}
