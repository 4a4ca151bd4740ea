//! Manifest-backed recycle store for one root.
//!
//! Every mutation follows the same protocol: load the manifest fresh, do the
//! physical move or delete, then persist the whole manifest. A manifest write
//! that fails after a move puts the file back where it was, so disk and
//! manifest agree whatever happens.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use super::manifest::{manifest_path, Manifest};
use super::{BatchOutcome, RecycleError, MANIFEST_TEMP_FILE, RECYCLE_DIR_NAME};

/// One recycled item as recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecycleEntry {
    /// Current location inside the recycle directory
    pub recycled: PathBuf,
    /// Location the item was recycled from
    pub original: PathBuf,
}

/// Handle on the recycle directory of one root.
#[derive(Debug, Clone)]
pub struct RecycleStore {
    dir: PathBuf,
}

impl RecycleStore {
    /// Open the store for `root`, creating the directory and an empty
    /// manifest when missing. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`RecycleError::Io`] if the directory cannot be created and
    /// [`RecycleError::Manifest`] if the initial manifest cannot be written.
    pub fn open(root: &Path) -> Result<Self, RecycleError> {
        let root = absolute(root);
        let store = Self {
            dir: root.join(RECYCLE_DIR_NAME),
        };
        store.ensure()?;
        Ok(store)
    }

    /// Use an existing recycle directory without touching the filesystem.
    #[must_use]
    pub fn at(recycle_dir: &Path) -> Self {
        Self {
            dir: absolute(recycle_dir),
        }
    }

    /// The recycle directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure(&self) -> Result<(), RecycleError> {
        fs::create_dir_all(&self.dir).map_err(|e| RecycleError::io(&self.dir, e))?;
        if fs::symlink_metadata(manifest_path(&self.dir)).is_err() {
            Manifest::new()
                .save(&self.dir)
                .map_err(|e| RecycleError::manifest(&self.dir, e))?;
            log::debug!("Created recycle area {}", self.dir.display());
        }
        Ok(())
    }

    /// Load the current manifest. Never fails; see [`Manifest::load`].
    #[must_use]
    pub fn manifest(&self) -> Manifest {
        Manifest::load(&self.dir)
    }

    /// Manifest entries in path order.
    #[must_use]
    pub fn entries(&self) -> Vec<RecycleEntry> {
        self.manifest()
            .iter()
            .map(|(recycled, original)| RecycleEntry {
                recycled: recycled.to_path_buf(),
                original: original.to_path_buf(),
            })
            .collect()
    }

    /// Turn user input into a manifest key.
    ///
    /// A bare file name is taken relative to the recycle directory; any
    /// other relative path is made absolute against the current directory.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        let mut components = path.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => self.dir.join(name),
            _ => absolute(path),
        }
    }

    fn save(&self, manifest: &Manifest) -> Result<(), RecycleError> {
        manifest
            .save(&self.dir)
            .map_err(|e| RecycleError::manifest(&self.dir, e))
    }

    /// First free destination for `name` inside the recycle directory.
    ///
    /// `movie.mkv` becomes `movie (1).mkv`, `movie (2).mkv`, ...; the part
    /// after the last dot is kept as the extension.
    #[must_use]
    pub fn unique_destination(&self, name: &std::ffi::OsStr) -> PathBuf {
        let candidate = self.dir.join(name);
        if !self.is_taken(&candidate) {
            return candidate;
        }

        let as_path = Path::new(name);
        let stem = as_path.file_stem().unwrap_or(name);
        let extension = as_path.extension();

        (1u64..)
            .map(|i| {
                let mut probe = OsString::from(stem);
                probe.push(format!(" ({i})"));
                if let Some(ext) = extension {
                    probe.push(".");
                    probe.push(ext);
                }
                self.dir.join(probe)
            })
            .find(|probe| !self.is_taken(probe))
            .unwrap_or(candidate)
    }

    fn is_taken(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok() || path == self.dir.join(MANIFEST_TEMP_FILE)
    }

    /// Move `source` into the recycle directory.
    ///
    /// Returns the recycled path, which is also the new manifest key.
    ///
    /// # Errors
    ///
    /// - [`RecycleError::SourceMissing`] if `source` does not exist
    /// - [`RecycleError::InsideRecycle`] if `source` is the recycle directory or inside it
    /// - [`RecycleError::NoFileName`] if `source` has no final component
    /// - [`RecycleError::Io`] if the move fails
    /// - [`RecycleError::Manifest`] if the manifest cannot be saved (the move is undone)
    pub fn move_in(&self, source: &Path) -> Result<PathBuf, RecycleError> {
        self.ensure()?;

        let source = absolute(source);
        if fs::symlink_metadata(&source).is_err() {
            return Err(RecycleError::SourceMissing(source));
        }
        if source.starts_with(&self.dir) {
            return Err(RecycleError::InsideRecycle(source));
        }
        let Some(name) = source.file_name() else {
            return Err(RecycleError::NoFileName(source));
        };

        let destination = self.unique_destination(name);
        move_path(&source, &destination).map_err(|e| RecycleError::io(&source, e))?;

        let mut manifest = self.manifest();
        manifest.insert(destination.clone(), source.clone());
        if let Err(e) = self.save(&manifest) {
            log::warn!("Undoing recycle of {}: {}", source.display(), e);
            if let Err(undo) = move_path(&destination, &source) {
                log::error!(
                    "Could not undo recycle, {} remains at {}: {}",
                    source.display(),
                    destination.display(),
                    undo
                );
            }
            return Err(e);
        }

        log::info!("Recycled {} -> {}", source.display(), destination.display());
        Ok(destination)
    }

    /// Move a recycled item back to its original location.
    ///
    /// Missing parent directories are recreated. Returns the original path.
    ///
    /// # Errors
    ///
    /// - [`RecycleError::NotInManifest`] if `recycled` is not recorded
    /// - [`RecycleError::MissingFromRecycle`] if the recorded item is gone
    /// - [`RecycleError::OriginalOccupied`] if something now exists at the original path
    /// - [`RecycleError::Io`] if the move fails
    /// - [`RecycleError::Manifest`] if the manifest cannot be saved (the move is undone)
    pub fn restore(&self, recycled: &Path) -> Result<PathBuf, RecycleError> {
        let recycled = self.resolve(recycled);
        let mut manifest = self.manifest();
        let Some(original) = manifest.get(&recycled).map(Path::to_path_buf) else {
            return Err(RecycleError::NotInManifest(recycled));
        };

        if fs::symlink_metadata(&recycled).is_err() {
            return Err(RecycleError::MissingFromRecycle(recycled));
        }
        if fs::symlink_metadata(&original).is_ok() {
            return Err(RecycleError::OriginalOccupied(original));
        }

        if let Some(parent) = original.parent() {
            fs::create_dir_all(parent).map_err(|e| RecycleError::io(parent, e))?;
        }
        move_path(&recycled, &original).map_err(|e| RecycleError::io(&recycled, e))?;

        manifest.remove(&recycled);
        if let Err(e) = self.save(&manifest) {
            log::warn!("Undoing restore of {}: {}", original.display(), e);
            if let Err(undo) = move_path(&original, &recycled) {
                log::error!(
                    "Could not undo restore of {}: {}",
                    original.display(),
                    undo
                );
            }
            return Err(e);
        }

        log::info!("Restored {} -> {}", recycled.display(), original.display());
        Ok(original)
    }

    /// Permanently delete a recycled item and drop its manifest entry.
    ///
    /// Returns the original path the item was recycled from.
    ///
    /// # Errors
    ///
    /// - [`RecycleError::NotInManifest`] if `recycled` is not recorded; nothing is deleted
    /// - [`RecycleError::Io`] if the item cannot be removed; the entry is kept
    /// - [`RecycleError::Manifest`] if the manifest cannot be saved after removal
    pub fn purge(&self, recycled: &Path) -> Result<PathBuf, RecycleError> {
        let recycled = self.resolve(recycled);
        let mut manifest = self.manifest();
        let Some(original) = manifest.get(&recycled).map(Path::to_path_buf) else {
            return Err(RecycleError::NotInManifest(recycled));
        };

        remove_path(&recycled).map_err(|e| RecycleError::io(&recycled, e))?;

        manifest.remove(&recycled);
        self.save(&manifest)?;

        log::info!("Deleted {} permanently", recycled.display());
        Ok(original)
    }

    /// Recycle every path, collecting per-item outcomes.
    pub fn move_batch<I, P>(&self, sources: I) -> BatchOutcome
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        run_batch(sources, |p| self.move_in(p))
    }

    /// Restore every path, collecting per-item outcomes.
    pub fn restore_batch<I, P>(&self, recycled: I) -> BatchOutcome
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        run_batch(recycled, |p| self.restore(p))
    }

    /// Permanently delete every path, collecting per-item outcomes.
    pub fn purge_batch<I, P>(&self, recycled: I) -> BatchOutcome
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        run_batch(recycled, |p| self.purge(p))
    }

    /// Restore everything currently recorded.
    pub fn restore_all(&self) -> BatchOutcome {
        let keys: Vec<PathBuf> = self.entries().into_iter().map(|e| e.recycled).collect();
        self.restore_batch(keys)
    }

    /// Permanently delete everything currently recorded.
    pub fn purge_all(&self) -> BatchOutcome {
        let keys: Vec<PathBuf> = self.entries().into_iter().map(|e| e.recycled).collect();
        self.purge_batch(keys)
    }
}

fn run_batch<I, P, F>(paths: I, mut op: F) -> BatchOutcome
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
    F: FnMut(&Path) -> Result<PathBuf, RecycleError>,
{
    let mut outcome = BatchOutcome::default();
    for path in paths {
        let path = path.as_ref();
        match op(path) {
            Ok(result) => outcome.succeeded.push((path.to_path_buf(), result)),
            Err(e) => {
                log::warn!("{e}");
                outcome.failed.push((path.to_path_buf(), e));
            }
        }
    }
    outcome
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Check if an error is a cross-device link error.
fn is_cross_device_error(err: &io::Error) -> bool {
    #[cfg(windows)]
    const NOT_SAME_DEVICE: i32 = 17; // ERROR_NOT_SAME_DEVICE
    #[cfg(not(windows))]
    const NOT_SAME_DEVICE: i32 = 18; // EXDEV

    err.raw_os_error() == Some(NOT_SAME_DEVICE)
}

/// Rename `from` to `to`, copying then removing across filesystems.
pub(crate) fn move_path(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            log::debug!(
                "Cross-device move {} -> {}, copying",
                from.display(),
                to.display()
            );
            copy_then_remove(from, to, remove_path)
        }
        Err(e) => Err(e),
    }
}

/// Copy `from` to `to`, then remove `from` with `remove_source`.
///
/// A failed copy is removed from `to`. If removing a file source fails the
/// copy is removed too, leaving the file only at `from`. A directory that
/// failed to remove may be partly gone, so its copy is kept.
fn copy_then_remove<F>(from: &Path, to: &Path, remove_source: F) -> io::Result<()>
where
    F: FnOnce(&Path) -> io::Result<()>,
{
    let source_is_dir = fs::symlink_metadata(from)?.is_dir();
    if let Err(copy_err) = copy_recursive(from, to) {
        discard_copy(to);
        return Err(copy_err);
    }
    if let Err(remove_err) = remove_source(from) {
        if source_is_dir {
            log::error!(
                "{} was copied to {} but could not be removed",
                from.display(),
                to.display()
            );
        } else {
            discard_copy(to);
        }
        return Err(remove_err);
    }
    Ok(())
}

fn discard_copy(to: &Path) {
    if fs::symlink_metadata(to).is_ok() {
        if let Err(e) = remove_path(to) {
            log::warn!("Could not remove copy at {}: {}", to.display(), e);
        }
    }
}

fn copy_recursive(from: &Path, to: &Path) -> io::Result<()> {
    if fs::symlink_metadata(from)?.is_dir() {
        fs::create_dir(to)?;
        for entry in fs::read_dir(from)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &to.join(entry.file_name()))?;
        }
        Ok(())
    } else {
        fs::copy(from, to).map(|_| ())
    }
}

/// Remove a file, symlink, or whole directory tree.
pub(crate) fn remove_path(path: &Path) -> io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
