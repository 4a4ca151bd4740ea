//! Reversible recycle area.
//!
//! Each scan root gets a hidden `.cleanup_recycle` directory holding recycled
//! files next to a `manifest.json` that maps every recycled path to the path
//! it came from. Items move `Active → Recycled` on [`move_to_recycle`], back
//! on [`restore_from_recycle`], and to `Purged` on [`delete_permanently`].
//!
//! The free functions here report success as `bool`/`Option` and log the
//! reason for a failure. [`RecycleStore`] exposes the same operations with
//! typed [`RecycleError`]s.
//!
//! # Example
//!
//! ```no_run
//! use cleanup_lite::recycle::{ensure_recycle, move_to_recycle, restore_from_recycle};
//! use std::path::Path;
//!
//! let root = Path::new("/home/user/Downloads");
//! if let Some(recycled) = move_to_recycle(root, &root.join("old.iso")) {
//!     let recycle_dir = ensure_recycle(root).unwrap();
//!     assert!(restore_from_recycle(&recycle_dir, &recycled));
//! }
//! ```

pub mod manifest;
pub mod store;

use std::io;
use std::path::{Path, PathBuf};

pub use manifest::Manifest;
pub use store::{RecycleEntry, RecycleStore};

/// Name of the reserved recycle directory under a root.
pub const RECYCLE_DIR_NAME: &str = ".cleanup_recycle";

/// Name of the manifest file inside the recycle directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Scratch file used while replacing the manifest.
pub const MANIFEST_TEMP_FILE: &str = "manifest.json.tmp";

/// Errors from recycle operations.
#[derive(thiserror::Error, Debug)]
pub enum RecycleError {
    /// The item to recycle does not exist.
    #[error("Source not found: {0}")]
    SourceMissing(PathBuf),

    /// The item is the recycle directory or lies inside it.
    #[error("Already inside the recycle area: {0}")]
    InsideRecycle(PathBuf),

    /// The path has no final component to name the recycled item after.
    #[error("Path has no file name: {0}")]
    NoFileName(PathBuf),

    /// The path is not a manifest key.
    #[error("Not recorded in the recycle manifest: {0}")]
    NotInManifest(PathBuf),

    /// The manifest records the item but it is gone from disk.
    #[error("Recycled item is missing: {0}")]
    MissingFromRecycle(PathBuf),

    /// Something already exists at the original location.
    #[error("Original location is occupied: {0}")]
    OriginalOccupied(PathBuf),

    /// A filesystem operation failed.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The manifest could not be written.
    #[error("Failed to save manifest in {path}: {source}")]
    Manifest {
        /// Recycle directory
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl RecycleError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn manifest(path: &Path, source: io::Error) -> Self {
        Self::Manifest {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Per-item outcome of a batch recycle operation.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// `(input, result)` pairs: the recycled path for moves, the original
    /// path for restores and deletes.
    pub succeeded: Vec<(PathBuf, PathBuf)>,
    /// Inputs that failed, with the reason.
    pub failed: Vec<(PathBuf, RecycleError)>,
}

impl BatchOutcome {
    /// Number of successful items.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.succeeded.len()
    }

    /// Number of failed items.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    /// Total number of attempted items.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Check if every item succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Human-readable summary, e.g. `Moved 3 item(s), 1 failed`.
    #[must_use]
    pub fn summary(&self, verb: &str) -> String {
        if self.all_succeeded() {
            format!("{} {} item(s)", verb, self.success_count())
        } else {
            format!(
                "{} {} item(s), {} failed",
                verb,
                self.success_count(),
                self.failure_count()
            )
        }
    }
}

/// Create the recycle directory and empty manifest under `root` if missing.
///
/// Returns the recycle directory, or `None` if it cannot be created.
#[must_use]
pub fn ensure_recycle(root: &Path) -> Option<PathBuf> {
    match RecycleStore::open(root) {
        Ok(store) => Some(store.dir().to_path_buf()),
        Err(e) => {
            log::warn!("{e}");
            None
        }
    }
}

/// Read the manifest of `recycle_dir`; empty when missing or corrupt.
#[must_use]
pub fn load_manifest(recycle_dir: &Path) -> Manifest {
    Manifest::load(recycle_dir)
}

/// Move `source` into the recycle area of `root`.
///
/// Returns the recycled path, or `None` on any failure.
#[must_use]
pub fn move_to_recycle(root: &Path, source: &Path) -> Option<PathBuf> {
    let result = RecycleStore::open(root).and_then(|store| store.move_in(source));
    match result {
        Ok(recycled) => Some(recycled),
        Err(e) => {
            log::warn!("{e}");
            None
        }
    }
}

/// Restore a recycled item to its original location.
#[must_use]
pub fn restore_from_recycle(recycle_dir: &Path, recycled: &Path) -> bool {
    match RecycleStore::at(recycle_dir).restore(recycled) {
        Ok(_) => true,
        Err(e) => {
            log::warn!("{e}");
            false
        }
    }
}

/// Permanently delete a recycled item and its manifest entry.
#[must_use]
pub fn delete_permanently(recycle_dir: &Path, recycled: &Path) -> bool {
    match RecycleStore::at(recycle_dir).purge(recycled) {
        Ok(_) => true,
        Err(e) => {
            log::warn!("{e}");
            false
        }
    }
}
