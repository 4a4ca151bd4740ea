//! JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! `large`:
//!
//! ```json
//! {
//!   "large_files": [{ "path": "/data/disk.iso", "size": 734003200 }],
//!   "summary": { "files": 1, "total_size": 734003200, "interrupted": false, ... }
//! }
//! ```
//!
//! `dupes`:
//!
//! ```json
//! {
//!   "duplicates": [
//!     { "hash": "b94d27b9...", "size": 1024, "files": ["/a/x.bin", "/b/x.bin"] }
//!   ],
//!   "recycled": [{ "recycled": "/a/.cleanup_recycle/x.bin", "original": "/b/x.bin" }],
//!   "summary": { "groups": 1, "reclaimable_space": 1024, ... }
//! }
//! ```
//!
//! `recycle list`:
//!
//! ```json
//! { "entries": [{ "recycled": "...", "original": "..." }] }
//! ```

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, FinderStats};
use crate::error::ExitCode;
use crate::recycle::RecycleEntry;
use crate::scanner::FileEntry;

/// A large file in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonLargeFile {
    /// Absolute path
    pub path: String,
    /// Size in bytes
    pub size: u64,
}

impl From<&FileEntry> for JsonLargeFile {
    fn from(entry: &FileEntry) -> Self {
        Self {
            path: path_string(&entry.path),
            size: entry.size,
        }
    }
}

/// A duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// Content digest as lowercase hex
    pub hash: String,
    /// Size of each member in bytes
    pub size: u64,
    /// Member paths
    pub files: Vec<String>,
}

impl From<&DuplicateGroup> for JsonDuplicateGroup {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            hash: group.hash_hex(),
            size: group.size,
            files: group.paths.iter().map(|p| path_string(p)).collect(),
        }
    }
}

/// A recycle manifest entry in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRecycleEntry {
    /// Location inside the recycle area
    pub recycled: String,
    /// Location the item came from
    pub original: String,
}

impl From<&RecycleEntry> for JsonRecycleEntry {
    fn from(entry: &RecycleEntry) -> Self {
        Self {
            recycled: path_string(&entry.recycled),
            original: path_string(&entry.original),
        }
    }
}

/// Summary of a large-file scan.
#[derive(Debug, Clone, Serialize)]
pub struct LargeFilesSummary {
    /// Number of files at or above the threshold
    pub files: usize,
    /// Combined size of those files in bytes
    pub total_size: u64,
    /// Threshold used, in bytes
    pub min_size: u64,
    /// Whether the scan was interrupted
    pub interrupted: bool,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name
    pub exit_code_name: String,
}

/// Document printed by `large --output json`.
#[derive(Debug, Clone, Serialize)]
pub struct LargeFilesOutput {
    /// Files in walk order
    pub large_files: Vec<JsonLargeFile>,
    /// Summary
    pub summary: LargeFilesSummary,
}

impl LargeFilesOutput {
    /// Build the document from scan results.
    #[must_use]
    pub fn new(files: &[FileEntry], min_size: u64, interrupted: bool, exit_code: ExitCode) -> Self {
        Self {
            large_files: files.iter().map(JsonLargeFile::from).collect(),
            summary: LargeFilesSummary {
                files: files.len(),
                total_size: files.iter().map(|f| f.size).sum(),
                min_size,
                interrupted,
                exit_code: exit_code.as_i32(),
                exit_code_name: exit_code.code_prefix().to_string(),
            },
        }
    }
}

/// Summary of a duplicate search.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicatesSummary {
    /// Files yielded by the walk
    pub files_walked: usize,
    /// Files at or above the threshold
    pub candidates: usize,
    /// Files submitted for hashing
    pub files_hashed: usize,
    /// Files that could not be hashed
    pub hash_failures: usize,
    /// Number of duplicate groups
    pub groups: usize,
    /// Number of files beyond the first of each group
    pub duplicate_files: usize,
    /// Bytes reclaimable by keeping one file per group
    pub reclaimable_space: u64,
    /// Whether the search was interrupted
    pub interrupted: bool,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name
    pub exit_code_name: String,
}

/// Document printed by `dupes --output json`.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicatesOutput {
    /// Groups in emission order
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Items moved into the recycle area, when requested
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recycled: Vec<JsonRecycleEntry>,
    /// Summary
    pub summary: DuplicatesSummary,
}

impl DuplicatesOutput {
    /// Build the document from search results.
    #[must_use]
    pub fn new(
        groups: &[DuplicateGroup],
        recycled: &[RecycleEntry],
        stats: &FinderStats,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            duplicates: groups.iter().map(JsonDuplicateGroup::from).collect(),
            recycled: recycled.iter().map(JsonRecycleEntry::from).collect(),
            summary: DuplicatesSummary {
                files_walked: stats.files_walked,
                candidates: stats.candidates,
                files_hashed: stats.files_hashed,
                hash_failures: stats.hash_failures,
                groups: groups.len(),
                duplicate_files: groups.iter().map(DuplicateGroup::duplicate_count).sum(),
                reclaimable_space: groups.iter().map(DuplicateGroup::wasted_space).sum(),
                interrupted: stats.interrupted,
                exit_code: exit_code.as_i32(),
                exit_code_name: exit_code.code_prefix().to_string(),
            },
        }
    }
}

/// Document printed by `recycle list --output json`.
#[derive(Debug, Clone, Serialize)]
pub struct RecycleListOutput {
    /// Manifest entries ordered by recycled path
    pub entries: Vec<JsonRecycleEntry>,
}

impl RecycleListOutput {
    /// Build the document from manifest entries.
    #[must_use]
    pub fn new(entries: &[RecycleEntry]) -> Self {
        Self {
            entries: entries.iter().map(JsonRecycleEntry::from).collect(),
        }
    }
}

/// Errors that can occur while writing JSON.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// Serialization failed.
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing failed.
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}

/// Write `value` as JSON followed by a newline.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_json<T, W>(value: &T, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError>
where
    T: Serialize,
    W: Write,
{
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, value)?;
    } else {
        serde_json::to_writer(&mut *writer, value)?;
    }
    writer.write_all(b"\n")?;
    Ok(())
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
