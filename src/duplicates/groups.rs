//! Size buckets, digest partitioning, and duplicate groups.
//!
//! # Overview
//!
//! Candidate files are first bucketed by exact byte size: files of different
//! sizes cannot share content. A bucket that reaches the soft cap is handed
//! back to the caller for hashing straight away; the rest wait until the walk
//! completes.
//!
//! Hash results for one size are folded into a [`DigestIndex`], which keeps
//! digests in first-seen order and drops files whose digest is absent.
//! Partitions with two or more members become [`DuplicateGroup`]s.
//!
//! # Example
//!
//! ```
//! use cleanup_lite::duplicates::SizeBuckets;
//! use std::path::PathBuf;
//!
//! let mut buckets = SizeBuckets::new(2);
//! assert!(buckets.push(1024, PathBuf::from("/a")).is_none());
//! let full = buckets.push(1024, PathBuf::from("/b")).unwrap();
//! assert_eq!(full.len(), 2);
//! assert!(buckets.is_empty());
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use crate::scanner::{hash_to_hex, Hash, HashResult};

/// Default soft cap on a size bucket before it is hashed early.
pub const DEFAULT_BUCKET_CAP: usize = 64;

/// Working set of candidate paths keyed by exact file size.
#[derive(Debug, Clone)]
pub struct SizeBuckets {
    cap: usize,
    buckets: HashMap<u64, Vec<PathBuf>>,
}

impl Default for SizeBuckets {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_CAP)
    }
}

impl SizeBuckets {
    /// Create an empty working set. A cap of zero is treated as one.
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            buckets: HashMap::new(),
        }
    }

    /// The effective soft cap.
    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Append a path to the bucket for `size`.
    ///
    /// When the bucket reaches the cap it is removed from the working set
    /// and returned.
    pub fn push(&mut self, size: u64, path: PathBuf) -> Option<Vec<PathBuf>> {
        let bucket = self.buckets.entry(size).or_default();
        bucket.push(path);
        if bucket.len() >= self.cap {
            self.buckets.remove(&size)
        } else {
            None
        }
    }

    /// Number of distinct sizes being tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Check if no bucket is being tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total number of paths held across all buckets.
    #[must_use]
    pub fn tracked_files(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Remove every remaining bucket, ordered by ascending size.
    pub fn drain_sorted(&mut self) -> Vec<(u64, Vec<PathBuf>)> {
        let mut remaining: Vec<_> = self.buckets.drain().collect();
        remaining.sort_unstable_by_key(|(size, _)| *size);
        remaining
    }
}

/// Hash results for one file size, partitioned by digest.
#[derive(Debug, Clone, Default)]
pub struct DigestIndex {
    slots: HashMap<Hash, usize>,
    partitions: Vec<(Hash, Vec<PathBuf>)>,
    failed: usize,
}

impl DigestIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one hash result in. Results without a digest are counted and dropped.
    pub fn insert(&mut self, result: HashResult) {
        let Some(digest) = result.digest else {
            self.failed += 1;
            return;
        };
        match self.slots.get(&digest) {
            Some(&slot) => self.partitions[slot].1.push(result.path),
            None => {
                self.slots.insert(digest, self.partitions.len());
                self.partitions.push((digest, vec![result.path]));
            }
        }
    }

    /// Number of files successfully hashed into the index.
    #[must_use]
    pub fn hashed(&self) -> usize {
        self.partitions.iter().map(|(_, paths)| paths.len()).sum()
    }

    /// Number of results dropped for lack of a digest.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Partitions with two or more members, in first-seen digest order.
    #[must_use]
    pub fn into_groups(self, size: u64) -> Vec<DuplicateGroup> {
        self.partitions
            .into_iter()
            .filter(|(_, paths)| paths.len() >= 2)
            .map(|(hash, paths)| DuplicateGroup::new(hash, size, paths))
            .collect()
    }
}

impl Extend<HashResult> for DigestIndex {
    fn extend<I: IntoIterator<Item = HashResult>>(&mut self, iter: I) {
        for result in iter {
            self.insert(result);
        }
    }
}

/// Partition one batch of same-size hash results into duplicate groups.
#[must_use]
pub fn partition_by_digest<I>(size: u64, results: I) -> Vec<DuplicateGroup>
where
    I: IntoIterator<Item = HashResult>,
{
    let mut index = DigestIndex::new();
    index.extend(results);
    index.into_groups(size)
}

/// Two or more files sharing both size and content digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Content digest shared by every member
    pub hash: Hash,
    /// File size in bytes, shared by every member
    pub size: u64,
    /// Member paths; order carries no meaning
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(hash: Hash, size: u64, paths: Vec<PathBuf>) -> Self {
        debug_assert!(paths.len() >= 2, "a duplicate group needs two members");
        Self { hash, size, paths }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.paths.len() as u64
    }

    /// Space reclaimable by keeping one copy.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Number of copies beyond the first.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }

    /// Hash as hexadecimal string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.hash)
    }

    /// Every member except the first, which is conventionally kept.
    #[must_use]
    pub fn extras(&self) -> &[PathBuf] {
        self.paths.get(1..).unwrap_or_default()
    }
}
