//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size bucketing with a soft cap (see [`SizeBuckets`])
//! - Parallel content hashing on a bounded pool
//! - Partitioning hash results into [`DuplicateGroup`]s

pub mod finder;
pub mod groups;

pub use finder::{
    build_hash_pool, DuplicateFinder, DuplicateGroups, FinderConfig, FinderError, FinderStats,
    DEFAULT_IO_THREADS,
};
pub use groups::{
    partition_by_digest, DigestIndex, DuplicateGroup, SizeBuckets, DEFAULT_BUCKET_CAP,
};
