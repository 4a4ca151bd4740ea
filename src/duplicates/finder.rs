//! Streaming duplicate finder.
//!
//! # Pipeline
//!
//! 1. **Walk**: files are streamed from the [`Walker`]; anything smaller than
//!    the threshold is dropped on the spot, the rest is appended to its size
//!    bucket.
//! 2. **Early hashing**: a bucket that reaches the soft cap is hashed at once
//!    on the bounded rayon pool, and its digests are kept for that size.
//! 3. **Drain**: after the walk, each remaining size (ascending) is hashed and
//!    merged with any earlier digests; every digest shared by two or more
//!    files becomes a [`DuplicateGroup`].
//!
//! Groups for one size are emitted together. Identical files therefore land
//! in exactly one group, even when their bucket was flushed more than once.
//! The cost is latency: digests of an early-flushed bucket are held until
//! the walk ends, so the first group appears only after the whole tree has
//! been walked.
//!
//! Symlinks are skipped unless the walker follows them. A file reached
//! through a second path (a followed link or a hard link) is counted once,
//! so a group never pairs a file with itself.
//!
//! Stop is checked per walked file, before every hashing batch, and before
//! every emitted group; pause is honored at the same points and inside the
//! hasher between chunks.
//!
//! # Example
//!
//! ```no_run
//! use cleanup_lite::control::ScanControl;
//! use cleanup_lite::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let config = FinderConfig::default().with_min_size(1024 * 1024);
//! let finder = DuplicateFinder::new(config, ScanControl::new()).unwrap();
//!
//! for group in finder.find(Path::new(".")) {
//!     println!("{} copies of {} bytes", group.len(), group.size);
//! }
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use super::groups::{DigestIndex, DuplicateGroup, SizeBuckets, DEFAULT_BUCKET_CAP};
use crate::control::ScanControl;
use crate::progress::ProgressCallback;
use crate::scanner::{HashAlgorithm, HashResult, Hasher, Walker, WalkerConfig, DEFAULT_CHUNK_SIZE};

/// Default number of hashing workers.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Progress phase for the walk.
pub const PHASE_WALKING: &str = "walking";
/// Progress phase for hashing.
pub const PHASE_HASHING: &str = "hashing";

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Smallest file size considered, in bytes (inclusive).
    pub min_size: u64,
    /// Number of hashing workers.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Soft cap on a size bucket before it is hashed early.
    pub bucket_cap: usize,
    /// Read chunk size for hashing.
    pub chunk_size: usize,
    /// Digest algorithm.
    pub algorithm: HashAlgorithm,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("min_size", &self.min_size)
            .field("io_threads", &self.io_threads)
            .field("bucket_cap", &self.bucket_cap)
            .field("chunk_size", &self.chunk_size)
            .field("algorithm", &self.algorithm)
            .field("walker_config", &self.walker_config)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            min_size: 0,
            io_threads: DEFAULT_IO_THREADS,
            bucket_cap: DEFAULT_BUCKET_CAP,
            chunk_size: DEFAULT_CHUNK_SIZE,
            algorithm: HashAlgorithm::default(),
            walker_config: WalkerConfig::default(),
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the minimum file size.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Set the number of hashing workers. Zero is treated as one.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the soft bucket cap. Zero is treated as one.
    #[must_use]
    pub fn with_bucket_cap(mut self, cap: usize) -> Self {
        self.bucket_cap = cap.max(1);
        self
    }

    /// Set the hashing chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, walker_config: WalkerConfig) -> Self {
        self.walker_config = walker_config;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Counters collected during one duplicate search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinderStats {
    /// Files yielded by the walker
    pub files_walked: usize,
    /// Files at or above the size threshold
    pub candidates: usize,
    /// Buckets hashed because they reached the soft cap
    pub early_flushes: usize,
    /// Hashing batches submitted to the pool, early or not
    pub buckets_hashed: usize,
    /// Files submitted for hashing
    pub files_hashed: usize,
    /// Files whose digest could not be computed
    pub hash_failures: usize,
    /// Symlinks and repeat paths to an already seen file
    pub links_skipped: usize,
    /// Groups emitted
    pub groups: usize,
    /// Total bytes reclaimable across emitted groups
    pub wasted_bytes: u64,
    /// Whether the search ended because of a stop request
    pub interrupted: bool,
}

/// Errors that can occur when setting up a duplicate search.
///
/// Failures during the search itself are soft and never surface here.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The hashing worker pool could not be built.
    #[error("Failed to build hashing pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Build a bounded rayon pool for hashing.
///
/// # Errors
///
/// Returns [`FinderError::ThreadPool`] if the OS refuses to spawn threads.
pub fn build_hash_pool(threads: usize) -> Result<rayon::ThreadPool, FinderError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|i| format!("cleanup-hash-{i}"))
        .build()?;
    Ok(pool)
}

/// Duplicate finder bound to one control handle and one worker pool.
pub struct DuplicateFinder {
    config: FinderConfig,
    control: ScanControl,
    pool: Arc<rayon::ThreadPool>,
}

impl DuplicateFinder {
    /// Create a finder with its own hashing pool.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::ThreadPool`] if the pool cannot be built.
    pub fn new(config: FinderConfig, control: ScanControl) -> Result<Self, FinderError> {
        let pool = Arc::new(build_hash_pool(config.io_threads)?);
        Ok(Self::with_pool(config, control, pool))
    }

    /// Create a finder that shares an existing pool.
    #[must_use]
    pub fn with_pool(
        config: FinderConfig,
        control: ScanControl,
        pool: Arc<rayon::ThreadPool>,
    ) -> Self {
        Self {
            config,
            control,
            pool,
        }
    }

    /// The finder's configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Search `root` for duplicate groups, lazily.
    ///
    /// A root that does not exist or cannot be read yields nothing.
    #[must_use]
    pub fn find(&self, root: &Path) -> DuplicateGroups {
        let walker =
            Walker::new(root, self.config.walker_config.clone()).with_control(self.control.clone());
        let hasher = Hasher::new()
            .with_algorithm(self.config.algorithm)
            .with_chunk_size(self.config.chunk_size)
            .with_control(self.control.clone());

        log::info!(
            "Searching {} for duplicates >= {} bytes ({} workers, cap {})",
            walker.root().display(),
            self.config.min_size,
            self.pool.current_num_threads(),
            self.config.bucket_cap
        );

        if let Some(progress) = &self.config.progress_callback {
            progress.on_phase_start(PHASE_WALKING, 0);
        }

        DuplicateGroups {
            paths: Box::new(walker.into_paths()),
            min_size: self.config.min_size,
            follow_symlinks: self.config.walker_config.follow_symlinks,
            seen: SeenFiles::default(),
            buckets: SizeBuckets::new(self.config.bucket_cap),
            settled: HashMap::new(),
            drain: None,
            pending: VecDeque::new(),
            hasher,
            pool: Arc::clone(&self.pool),
            control: self.control.clone(),
            progress: self.config.progress_callback.clone(),
            hashed_counter: Arc::new(AtomicUsize::new(0)),
            stats: FinderStats::default(),
            done: false,
        }
    }
}

/// Files already taken as candidates, keyed by device and inode.
#[derive(Debug, Default)]
struct SeenFiles {
    #[cfg(unix)]
    inodes: HashSet<(u64, u64)>,
}

impl SeenFiles {
    /// Record `metadata`; `false` if the same file was recorded before.
    #[cfg(unix)]
    fn first_visit(&mut self, metadata: &fs::Metadata) -> bool {
        use std::os::unix::fs::MetadataExt;
        self.inodes.insert((metadata.dev(), metadata.ino()))
    }

    #[cfg(not(unix))]
    fn first_visit(&mut self, _metadata: &fs::Metadata) -> bool {
        true
    }
}

/// Lazy sequence of duplicate groups for one search.
///
/// Created by [`DuplicateFinder::find`]. Once a stop is requested, no
/// further groups are yielded; groups already yielded stay valid.
pub struct DuplicateGroups {
    paths: Box<dyn Iterator<Item = PathBuf>>,
    min_size: u64,
    follow_symlinks: bool,
    seen: SeenFiles,
    buckets: SizeBuckets,
    /// Digests of buckets hashed early, per size.
    settled: HashMap<u64, DigestIndex>,
    /// Sizes left to finalize once the walk is over.
    drain: Option<std::vec::IntoIter<(u64, Vec<PathBuf>)>>,
    pending: VecDeque<DuplicateGroup>,
    hasher: Hasher,
    pool: Arc<rayon::ThreadPool>,
    control: ScanControl,
    progress: Option<Arc<dyn ProgressCallback>>,
    hashed_counter: Arc<AtomicUsize>,
    stats: FinderStats,
    done: bool,
}

impl DuplicateGroups {
    /// Counters for the search so far.
    #[must_use]
    pub fn stats(&self) -> &FinderStats {
        &self.stats
    }

    fn stop(&mut self) -> Option<DuplicateGroup> {
        if !self.done {
            log::info!("Duplicate search stopped");
            self.stats.interrupted = true;
        }
        self.finish();
        None
    }

    fn finish(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        self.pending.clear();
        if let Some(progress) = &self.progress {
            progress.on_phase_end(PHASE_HASHING);
        }
        log::info!(
            "Duplicate search finished: {} groups, {} candidates, {} hash failures",
            self.stats.groups,
            self.stats.candidates,
            self.stats.hash_failures
        );
    }

    /// Hash one batch of same-size paths on the pool, preserving input order.
    fn hash_batch(&mut self, paths: Vec<PathBuf>) -> Vec<HashResult> {
        self.stats.buckets_hashed += 1;
        self.stats.files_hashed += paths.len();
        let hasher = &self.hasher;
        let progress = self.progress.as_deref();
        let counter = &self.hashed_counter;

        let results: Vec<HashResult> = self.pool.install(|| {
            paths
                .into_par_iter()
                .map(|path| {
                    let result = hasher.hash_result(path);
                    if let Some(progress) = progress {
                        let current = counter.fetch_add(1, Ordering::Relaxed) + 1;
                        progress.on_progress(current, &result.path.to_string_lossy());
                    }
                    result
                })
                .collect()
        });

        let failed = results.iter().filter(|r| r.digest.is_none()).count();
        self.stats.hash_failures += failed;
        results
    }

    /// Advance the walk by one file. Returns `false` when the walk is over.
    fn walk_one(&mut self) -> bool {
        let Some(path) = self.paths.next() else {
            return false;
        };
        self.stats.files_walked += 1;

        let metadata = match fs::symlink_metadata(&path) {
            Ok(m) if m.file_type().is_symlink() && !self.follow_symlinks => {
                log::trace!("Skipping symlink {}", path.display());
                self.stats.links_skipped += 1;
                return true;
            }
            Ok(m) if m.file_type().is_symlink() => fs::metadata(&path),
            other => other,
        };
        let metadata = match metadata {
            Ok(m) if m.is_file() => m,
            Ok(_) => return true,
            Err(e) => {
                log::debug!("Skipping {}: {}", path.display(), e);
                return true;
            }
        };
        let size = metadata.len();
        if size < self.min_size {
            return true;
        }
        if !self.seen.first_visit(&metadata) {
            log::debug!("Skipping {}: same file as an earlier path", path.display());
            self.stats.links_skipped += 1;
            return true;
        }

        self.stats.candidates += 1;
        if let Some(progress) = &self.progress {
            progress.on_progress(self.stats.files_walked, &path.to_string_lossy());
        }

        if let Some(full) = self.buckets.push(size, path) {
            if !self.control.checkpoint() {
                return true;
            }
            log::debug!("Bucket for {} bytes reached cap, hashing {} files", size, full.len());
            self.stats.early_flushes += 1;
            let results = self.hash_batch(full);
            self.settled.entry(size).or_default().extend(results);
        }
        true
    }

    /// Start the drain: every size with unhashed paths or early digests.
    fn begin_drain(&mut self) {
        let mut remaining = self.buckets.drain_sorted();
        let bucketed: HashSet<u64> = remaining.iter().map(|(size, _)| *size).collect();
        for size in self.settled.keys() {
            if !bucketed.contains(size) {
                remaining.push((*size, Vec::new()));
            }
        }
        remaining.sort_unstable_by_key(|(size, _)| *size);

        if let Some(progress) = &self.progress {
            progress.on_phase_end(PHASE_WALKING);
            let to_hash: usize = remaining
                .iter()
                .filter(|(size, paths)| paths.len() >= 2 || self.settled.contains_key(size))
                .map(|(_, paths)| paths.len())
                .sum();
            progress.on_phase_start(
                PHASE_HASHING,
                to_hash + self.hashed_counter.load(Ordering::Relaxed),
            );
        }

        log::debug!(
            "Walk complete: {} files, {} candidates across {} sizes",
            self.stats.files_walked,
            self.stats.candidates,
            remaining.len()
        );
        self.drain = Some(remaining.into_iter());
    }

    /// Finalize the next size with potential duplicates.
    ///
    /// Returns `false` when every size has been processed.
    fn drain_one(&mut self) -> bool {
        let Some((size, paths)) = self.drain.as_mut().and_then(Iterator::next) else {
            return false;
        };

        let mut index = self.settled.remove(&size).unwrap_or_default();
        if paths.len() < 2 && index.hashed() == 0 {
            return true;
        }
        if !paths.is_empty() {
            let results = self.hash_batch(paths);
            index.extend(results);
        }

        let groups = index.into_groups(size);
        for group in &groups {
            self.stats.wasted_bytes += group.wasted_space();
        }
        self.stats.groups += groups.len();
        self.pending.extend(groups);
        true
    }
}

impl Iterator for DuplicateGroups {
    type Item = DuplicateGroup;

    fn next(&mut self) -> Option<DuplicateGroup> {
        loop {
            if self.done {
                return None;
            }
            if !self.control.checkpoint() {
                return self.stop();
            }
            if let Some(group) = self.pending.pop_front() {
                return Some(group);
            }

            if self.drain.is_none() {
                if !self.walk_one() {
                    self.begin_drain();
                }
                continue;
            }

            if !self.drain_one() {
                self.finish();
                return None;
            }
        }
    }
}
