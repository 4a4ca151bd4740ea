//! Output formatters for scan and recycle results.
//!
//! - [`text`]: human-readable lines with sizes and highlighting
//! - [`json`]: machine-readable documents for scripting
//!
//! # Example
//!
//! ```no_run
//! use cleanup_lite::control::ScanControl;
//! use cleanup_lite::error::ExitCode;
//! use cleanup_lite::output::json::{write_json, LargeFilesOutput};
//! use cleanup_lite::scanner::big_files;
//! use std::path::Path;
//!
//! let files: Vec<_> = big_files(Path::new("."), 1 << 20, &ScanControl::new()).collect();
//! let output = LargeFilesOutput::new(&files, 1 << 20, false, ExitCode::Success);
//! write_json(&output, &mut std::io::stdout(), true).unwrap();
//! ```

pub mod json;
pub mod text;

pub use json::{
    write_json, DuplicatesOutput, JsonOutputError, LargeFilesOutput, RecycleListOutput,
};
