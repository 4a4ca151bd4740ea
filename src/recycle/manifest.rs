//! The recycle manifest: recycled path → original path.
//!
//! Stored as a pretty-printed JSON object in `manifest.json` inside the
//! recycle directory. Loading never fails: a missing, unreadable, or corrupt
//! manifest reads as empty. Saving replaces the whole file atomically.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{MANIFEST_FILE, MANIFEST_TEMP_FILE};

/// Mapping from each recycled path to the path it was recycled from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<PathBuf, PathBuf>,
}

/// Path of the manifest file inside a recycle directory.
#[must_use]
pub fn manifest_path(recycle_dir: &Path) -> PathBuf {
    recycle_dir.join(MANIFEST_FILE)
}

impl Manifest {
    /// Create an empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the manifest of `recycle_dir`, or an empty one.
    #[must_use]
    pub fn load(recycle_dir: &Path) -> Self {
        let path = manifest_path(recycle_dir);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    log::warn!("Could not read {}: {}", path.display(), e);
                }
                return Self::default();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Ignoring corrupt manifest {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Persist the manifest, replacing the previous file.
    ///
    /// The content is written to a sibling temp file which is then renamed
    /// over `manifest.json`, so readers see either the old or the new state.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if writing or renaming fails.
    pub fn save(&self, recycle_dir: &Path) -> io::Result<()> {
        let path = manifest_path(recycle_dir);
        let temp_path = recycle_dir.join(MANIFEST_TEMP_FILE);

        let result = (|| -> io::Result<()> {
            let mut writer = BufWriter::new(File::create(&temp_path)?);
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
            drop(writer);
            fs::rename(&temp_path, &path)
        })();

        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }

    /// Original path recorded for `recycled`.
    #[must_use]
    pub fn get(&self, recycled: &Path) -> Option<&Path> {
        self.entries.get(recycled).map(PathBuf::as_path)
    }

    /// Check if `recycled` is recorded.
    #[must_use]
    pub fn contains(&self, recycled: &Path) -> bool {
        self.entries.contains_key(recycled)
    }

    /// Record a recycled path. Returns the previous original, if any.
    pub fn insert(&mut self, recycled: PathBuf, original: PathBuf) -> Option<PathBuf> {
        self.entries.insert(recycled, original)
    }

    /// Drop an entry, returning its original path.
    pub fn remove(&mut self, recycled: &Path) -> Option<PathBuf> {
        self.entries.remove(recycled)
    }

    /// Entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.entries
            .iter()
            .map(|(recycled, original)| (recycled.as_path(), original.as_path()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
