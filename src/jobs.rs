//! Background scan jobs.
//!
//! A front end must never block on the core. Each job runs one scan on its
//! own thread and streams [`ScanEvent`]s over an unbounded
//! `crossbeam-channel`; the consumer drains them at its own pace with
//! `recv`, `try_recv` or `recv_timeout`, and pauses or stops the job through
//! [`JobHandle::control`].
//!
//! Every job ends with exactly one [`ScanEvent::Finished`], unless the
//! receiver was dropped first.
//!
//! # Example
//!
//! ```no_run
//! use cleanup_lite::control::ScanControl;
//! use cleanup_lite::jobs::{spawn_large_file_scan, ScanEvent};
//! use cleanup_lite::scanner::WalkerConfig;
//! use std::path::Path;
//!
//! let job = spawn_large_file_scan(
//!     Path::new("."),
//!     50 * 1024 * 1024,
//!     WalkerConfig::default(),
//!     ScanControl::new(),
//! )
//! .unwrap();
//!
//! for event in job.receiver().iter() {
//!     if let ScanEvent::LargeFile(file) = event {
//!         println!("{} ({} bytes)", file.path.display(), file.size);
//!     }
//! }
//! job.join().unwrap();
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::control::ScanControl;
use crate::duplicates::{DuplicateFinder, DuplicateGroup, FinderConfig, FinderStats};
use crate::progress::ProgressCallback;
use crate::scanner::size_filter::PHASE_SCANNING;
use crate::scanner::{FileEntry, LargeFiles, Walker, WalkerConfig};

/// Progress phase for the counting pre-pass.
pub const PHASE_COUNTING: &str = "counting";

/// Messages streamed from a running job.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Number of files the walk will visit, from the counting pass.
    Total(usize),
    /// A progress phase started; `total` is 0 when unknown.
    Phase {
        /// Phase name
        name: String,
        /// Expected number of items
        total: usize,
    },
    /// One more item processed in the current phase.
    Progress {
        /// Items processed so far (1-based)
        done: usize,
        /// Item being processed
        path: PathBuf,
    },
    /// A file at or above the size threshold.
    LargeFile(FileEntry),
    /// A duplicate group; ids start at 1 and increase by one.
    DuplicateGroup {
        /// Sequence number of the group within this search
        id: usize,
        /// The group itself
        group: DuplicateGroup,
    },
    /// Final counters of a duplicate search.
    Stats(FinderStats),
    /// The job is over.
    Finished {
        /// Whether the job ended because of a stop request
        interrupted: bool,
    },
}

/// Errors from starting or joining a job.
#[derive(thiserror::Error, Debug)]
pub enum JobError {
    /// The worker thread could not be spawned.
    #[error("Failed to spawn scan thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The worker thread panicked.
    #[error("Scan thread panicked")]
    Panicked,
}

/// Handle on a running job.
///
/// Dropping the handle without joining requests a stop.
pub struct JobHandle<T> {
    receiver: Receiver<T>,
    control: ScanControl,
    thread: Option<JoinHandle<()>>,
}

impl<T> JobHandle<T> {
    fn new(receiver: Receiver<T>, control: ScanControl, thread: JoinHandle<()>) -> Self {
        Self {
            receiver,
            control,
            thread: Some(thread),
        }
    }

    /// The event receiver.
    #[must_use]
    pub fn receiver(&self) -> &Receiver<T> {
        &self.receiver
    }

    /// The control shared with the worker.
    #[must_use]
    pub fn control(&self) -> &ScanControl {
        &self.control
    }

    /// Check if the worker thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the worker thread to exit.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Panicked`] if the worker panicked.
    pub fn join(mut self) -> Result<(), JobError> {
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| JobError::Panicked),
            None => Ok(()),
        }
    }
}

impl<T> Drop for JobHandle<T> {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.control.request_stop();
        }
    }
}

/// Forwards progress callbacks into a job's event channel.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    sender: Sender<ScanEvent>,
}

impl ChannelProgress {
    /// Wrap a sender.
    #[must_use]
    pub fn new(sender: Sender<ScanEvent>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        let _ = self.sender.send(ScanEvent::Phase {
            name: phase.to_string(),
            total,
        });
    }

    fn on_progress(&self, current: usize, path: &str) {
        let _ = self.sender.send(ScanEvent::Progress {
            done: current,
            path: PathBuf::from(path),
        });
    }

    fn on_phase_end(&self, _phase: &str) {}
}

/// Scan `root` for files of at least `min_size` bytes in the background.
///
/// Emits `Phase("counting")`, `Total`, `Phase("scanning")`, then
/// `Progress`/`LargeFile` events in walk order, then `Finished`.
///
/// # Errors
///
/// Returns [`JobError::Spawn`] if the worker thread cannot be started.
pub fn spawn_large_file_scan(
    root: &Path,
    min_size: u64,
    walker_config: WalkerConfig,
    control: ScanControl,
) -> Result<JobHandle<ScanEvent>, JobError> {
    let (tx, rx) = unbounded();
    let root = root.to_path_buf();
    let worker_control = control.clone();

    let thread = thread::Builder::new()
        .name("cleanup-large".to_string())
        .spawn(move || {
            let walker = Walker::new(&root, walker_config).with_control(worker_control.clone());
            let progress = Arc::new(ChannelProgress::new(tx.clone()));

            progress.on_phase_start(PHASE_COUNTING, 0);
            let total = walker.count_files(&worker_control);
            progress.on_phase_end(PHASE_COUNTING);
            let _ = tx.send(ScanEvent::Total(total));

            progress.on_phase_start(PHASE_SCANNING, total);
            let mut found = 0usize;
            for entry in LargeFiles::new(walker, min_size, worker_control.clone())
                .with_progress(progress)
            {
                found += 1;
                if tx.send(ScanEvent::LargeFile(entry)).is_err() {
                    log::debug!("Receiver dropped, ending large-file scan");
                    return;
                }
            }

            let interrupted = worker_control.is_stop_requested();
            log::info!(
                "Large-file scan of {} done: {} of {} files >= {} bytes{}",
                root.display(),
                found,
                total,
                min_size,
                if interrupted { " (interrupted)" } else { "" }
            );
            let _ = tx.send(ScanEvent::Finished { interrupted });
        })?;

    Ok(JobHandle::new(rx, control, thread))
}

/// Search `root` for duplicate groups in the background.
///
/// `config.progress_callback` is replaced by one that forwards into the
/// channel. Emits `Phase`/`Progress` events, one `DuplicateGroup` per group,
/// `Stats`, then `Finished`.
///
/// # Errors
///
/// Returns [`JobError::Spawn`] if the worker thread cannot be started.
pub fn spawn_duplicate_search(
    root: &Path,
    config: FinderConfig,
    pool: Arc<rayon::ThreadPool>,
    control: ScanControl,
) -> Result<JobHandle<ScanEvent>, JobError> {
    let (tx, rx) = unbounded();
    let root = root.to_path_buf();
    let worker_control = control.clone();

    let thread = thread::Builder::new()
        .name("cleanup-dupes".to_string())
        .spawn(move || {
            let progress = Arc::new(ChannelProgress::new(tx.clone()));
            let config = config.with_progress_callback(progress);
            let finder = DuplicateFinder::with_pool(config, worker_control.clone(), pool);

            let mut groups = finder.find(&root);
            let mut id = 0usize;
            for group in groups.by_ref() {
                id += 1;
                if tx.send(ScanEvent::DuplicateGroup { id, group }).is_err() {
                    log::debug!("Receiver dropped, ending duplicate search");
                    return;
                }
            }

            let stats = groups.stats().clone();
            let interrupted = stats.interrupted || worker_control.is_stop_requested();
            let _ = tx.send(ScanEvent::Stats(stats));
            let _ = tx.send(ScanEvent::Finished { interrupted });
        })?;

    Ok(JobHandle::new(rx, control, thread))
}
