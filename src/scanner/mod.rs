//! Scanner module for directory traversal, size filtering, and file hashing.
//!
//! This module provides functionality for:
//! - Streaming depth-first directory walking using walkdir
//! - Filtering the walk to files at or above a size threshold ("large files")
//! - Chunked content hashing with SHA-256 or BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`size_filter`]: Large-file filtering on top of the walker
//! - [`hasher`]: Chunked, cancellable content hashing
//!
//! # Example
//!
//! ```no_run
//! use cleanup_lite::control::ScanControl;
//! use cleanup_lite::scanner::big_files;
//! use std::path::Path;
//!
//! let control = ScanControl::new();
//! for file in big_files(Path::new("."), 100 * 1024 * 1024, &control) {
//!     println!("{}: {} bytes", file.path.display(), file.size);
//! }
//! ```

pub mod hasher;
pub mod size_filter;
pub mod walker;

use std::path::{Path, PathBuf};

// Re-export main types
pub use hasher::{hash_to_hex, hex_to_hash, Hash, HashAlgorithm, HashResult, Hasher, DEFAULT_CHUNK_SIZE};
pub use size_filter::{big_files, LargeFiles};
pub use walker::Walker;

/// A file discovered by the scanner, with the size read at scan time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileEntry {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileEntry {
    /// Create a new FileEntry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Descend into symbolically linked directories.
    /// walkdir detects loops when this is enabled.
    pub follow_symlinks: bool,

    /// Also walk the reserved recycle directory under the root.
    /// Off by default so recycled files never show up as scan results.
    pub include_recycle_dir: bool,
}

impl WalkerConfig {
    /// Set whether symlinked directories are followed.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set whether the recycle directory is walked too.
    #[must_use]
    pub fn with_include_recycle_dir(mut self, include: bool) -> Self {
        self.include_recycle_dir = include;
        self
    }
}

/// Errors that can occur when validating a scan root.
///
/// Errors below the root are soft-skipped and never surface as values.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Check that `root` exists and is a directory, returning its absolute form.
///
/// # Errors
///
/// Returns [`ScanError::NotFound`] or [`ScanError::NotADirectory`].
pub fn validate_root(root: &Path) -> Result<PathBuf, ScanError> {
    if !root.exists() {
        return Err(ScanError::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    Ok(std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf()))
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// A stop was requested before the file was fully read.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    pub(crate) fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}
