//! Directory walker built on walkdir.
//!
//! # Overview
//!
//! [`Walker`] produces a lazy, finite stream of absolute file paths under a
//! root, depth-first, in directory-entry order. Ordering across sibling
//! directories depends on the filesystem and must not be relied upon.
//!
//! # Behavior
//!
//! - Unreadable directories and entries are skipped silently (logged at debug)
//! - Directories are never yielded; symlinks to files are
//! - The reserved recycle directory of the root is pruned unless
//!   [`WalkerConfig::include_recycle_dir`] is set
//! - When a [`ScanControl`] is attached, the stream ends as soon as a stop is
//!   requested
//!
//! # Example
//!
//! ```no_run
//! use cleanup_lite::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! for path in walker.walk() {
//!     println!("{}", path.display());
//! }
//! ```

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::WalkerConfig;
use crate::control::ScanControl;
use crate::recycle::RECYCLE_DIR_NAME;

/// Streaming directory walker.
#[derive(Debug, Clone)]
pub struct Walker {
    /// Absolute root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional control for early termination
    control: Option<ScanControl>,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// Relative paths are made absolute against the current directory.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
            config,
            control: None,
        }
    }

    /// Attach a control so the walk ends when a stop is requested.
    #[must_use]
    pub fn with_control(mut self, control: ScanControl) -> Self {
        self.control = Some(control);
        self
    }

    /// The absolute root this walker starts from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_stop_requested(&self) -> bool {
        self.control
            .as_ref()
            .is_some_and(ScanControl::is_stop_requested)
    }

    /// Walk the directory tree, yielding file paths.
    ///
    /// The returned iterator is independent of `self`.
    pub fn walk(&self) -> impl Iterator<Item = PathBuf> {
        self.clone().into_paths()
    }

    /// Consume the walker and yield file paths.
    pub fn into_paths(self) -> impl Iterator<Item = PathBuf> {
        let pruned = (!self.config.include_recycle_dir).then(|| self.root.join(RECYCLE_DIR_NAME));

        let walk_dir = WalkDir::new(&self.root).follow_links(self.config.follow_symlinks);

        walk_dir
            .into_iter()
            .filter_entry(move |entry| match &pruned {
                Some(dir) if entry.file_type().is_dir() => entry.path() != dir.as_path(),
                _ => true,
            })
            .take_while(move |_| {
                if self.is_stop_requested() {
                    log::debug!("Walker: stop requested, ending traversal");
                    false
                } else {
                    true
                }
            })
            .filter_map(|result| match result {
                Ok(entry) => {
                    if entry.file_type().is_dir() {
                        None
                    } else {
                        Some(entry.into_path())
                    }
                }
                Err(e) => {
                    log::debug!(
                        "Skipping unreadable entry {}: {}",
                        e.path().map_or_else(|| "?".into(), |p| p.display().to_string()),
                        e
                    );
                    None
                }
            })
    }

    /// Count the files a walk would yield.
    ///
    /// Honors pause and stop at every entry; a stopped count returns the
    /// number seen so far. Used as the progress denominator.
    #[must_use]
    pub fn count_files(&self, control: &ScanControl) -> usize {
        let mut total = 0;
        for _ in self.walk() {
            if !control.checkpoint() {
                break;
            }
            total += 1;
        }
        log::debug!("Counted {} files under {}", total, self.root.display());
        total
    }
}
