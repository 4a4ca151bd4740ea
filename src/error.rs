//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the cleanup-lite application.
///
/// - 0: Success (completed normally, something was found or done)
/// - 1: General error (unexpected failure)
/// - 2: Nothing found (completed normally, no results)
/// - 3: Partial success (some items of a batch failed)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the command completed and produced results.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Nothing found: the scan completed with no results.
    NothingFound = 2,
    /// Partial success: some items of a batch operation failed.
    PartialSuccess = 3,
    /// Interrupted: the operation was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "CL000",
            Self::GeneralError => "CL001",
            Self::NothingFound => "CL002",
            Self::PartialSuccess => "CL003",
            Self::Interrupted => "CL130",
        }
    }
}

/// Returned by the application layer when a stop request ended a command.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Operation interrupted by user")]
pub struct InterruptedError;

/// Map an application error to its exit code.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    if err.downcast_ref::<InterruptedError>().is_some() {
        ExitCode::Interrupted
    } else {
        ExitCode::GeneralError
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "CL001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
