//! Human-readable text output.
//!
//! Sizes are rendered with `bytesize`, highlighting with `yansi`. Color is
//! switched off globally by the caller (`yansi::disable`) for `--no-color`.

use bytesize::ByteSize;
use yansi::Paint;

use crate::duplicates::{DuplicateGroup, FinderStats};
use crate::recycle::RecycleEntry;
use crate::scanner::FileEntry;

/// Format a byte count for display.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// One line per large file: size column, then path.
#[must_use]
pub fn large_file_line(entry: &FileEntry) -> String {
    format!(
        "{:>12}  {}",
        format_size(entry.size).bold(),
        entry.path.display()
    )
}

/// Closing line of a large-file scan.
#[must_use]
pub fn large_summary(files: &[FileEntry], min_size: u64) -> String {
    let total: u64 = files.iter().map(|f| f.size).sum();
    format!(
        "{} file(s) of at least {}, {} in total",
        files.len(),
        format_size(min_size),
        format_size(total)
    )
}

/// Header, digest and members of one group.
///
/// The first member is marked as kept; the others are extras.
#[must_use]
pub fn group_block(id: usize, group: &DuplicateGroup) -> String {
    let mut out = format!(
        "{} {} files, {} each, {} reclaimable\n",
        format!("Group {id}:").cyan().bold(),
        group.len(),
        format_size(group.size),
        format_size(group.wasted_space()).yellow()
    );
    out.push_str(&format!("  {}\n", group.hash_hex().dim()));
    for (i, path) in group.paths.iter().enumerate() {
        let marker = if i == 0 { "keep" } else { "dup " };
        out.push_str(&format!("  [{}] {}\n", marker, path.display()));
    }
    out
}

/// Closing lines of a duplicate search.
#[must_use]
pub fn dupes_summary(groups: &[DuplicateGroup], stats: &FinderStats) -> String {
    let wasted: u64 = groups.iter().map(DuplicateGroup::wasted_space).sum();
    let mut out = format!(
        "{} group(s), {} reclaimable ({} files walked, {} hashed",
        groups.len(),
        format_size(wasted).green().bold(),
        stats.files_walked,
        stats.files_hashed
    );
    if stats.hash_failures > 0 {
        out.push_str(&format!(", {} unreadable", stats.hash_failures));
    }
    out.push(')');
    out
}

/// One manifest entry: recycled location, then where it came from.
#[must_use]
pub fn recycle_entry_line(entry: &RecycleEntry) -> String {
    format!(
        "{}\n    {} {}",
        entry.recycled.display(),
        "from".dim(),
        entry.original.display()
    )
}
