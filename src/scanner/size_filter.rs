//! Large-file filter over the directory walk.
//!
//! [`big_files`] lazily yields every regular file under a root whose size is
//! at or above a threshold, in the walker's order. The threshold is
//! inclusive: a file of exactly `min_size` bytes is reported.
//!
//! Stop and pause are checked before each file is stat'ed. Files that vanish
//! or cannot be stat'ed between discovery and stat are skipped.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{FileEntry, Walker, WalkerConfig};
use crate::control::ScanControl;
use crate::progress::ProgressCallback;

/// Progress phase name reported by [`LargeFiles`].
pub const PHASE_SCANNING: &str = "scanning";

/// Lazy stream of files at or above a size threshold.
pub struct LargeFiles {
    paths: Box<dyn Iterator<Item = PathBuf>>,
    min_size: u64,
    control: ScanControl,
    progress: Option<Arc<dyn ProgressCallback>>,
    scanned: usize,
    done: bool,
}

impl LargeFiles {
    /// Build a filter over an explicit walker.
    #[must_use]
    pub fn new(walker: Walker, min_size: u64, control: ScanControl) -> Self {
        Self {
            paths: Box::new(walker.into_paths()),
            min_size,
            control,
            progress: None,
            scanned: 0,
            done: false,
        }
    }

    /// Report per-file progress under the `scanning` phase.
    ///
    /// The phase is started with a total of 0; callers that know the file
    /// count up front call `on_phase_start` themselves.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Number of files stat'ed so far, matching or not.
    #[must_use]
    pub fn scanned(&self) -> usize {
        self.scanned
    }

    fn finish(&mut self) {
        if !self.done {
            self.done = true;
            if let Some(progress) = &self.progress {
                progress.on_phase_end(PHASE_SCANNING);
            }
        }
    }
}

impl Iterator for LargeFiles {
    type Item = FileEntry;

    fn next(&mut self) -> Option<FileEntry> {
        if self.done {
            return None;
        }

        loop {
            if !self.control.checkpoint() {
                log::debug!("Large-file scan stopped after {} files", self.scanned);
                self.finish();
                return None;
            }

            let Some(path) = self.paths.next() else {
                self.finish();
                return None;
            };

            self.scanned += 1;
            if let Some(progress) = &self.progress {
                progress.on_progress(self.scanned, &path.to_string_lossy());
            }

            let metadata = match fs::metadata(&path) {
                Ok(m) => m,
                Err(e) => {
                    log::debug!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            if !metadata.is_file() {
                log::trace!("Skipping non-regular file {}", path.display());
                continue;
            }

            let size = metadata.len();
            if size >= self.min_size {
                log::trace!("Large file {} ({} bytes)", path.display(), size);
                return Some(FileEntry::new(path, size));
            }
        }
    }
}

/// Yield files under `root` whose size is at least `min_size` bytes.
///
/// Uses the default [`WalkerConfig`], so the recycle directory is not
/// scanned and symlinked directories are not followed. A root that does not
/// exist or cannot be read yields nothing.
#[must_use]
pub fn big_files(root: &Path, min_size: u64, control: &ScanControl) -> LargeFiles {
    let walker = Walker::new(root, WalkerConfig::default()).with_control(control.clone());
    LargeFiles::new(walker, min_size, control.clone())
}
