//! Command-line interface definitions for cleanup-lite.
//!
//! All arguments are declared with the clap derive API. Global options
//! (verbosity, color, error format) apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # List files of 100 MB or more
//! cleanup-lite large ~/Downloads --min-size 100MB
//!
//! # Find duplicates and recycle every copy but the first
//! cleanup-lite dupes ~/Downloads --recycle-extras
//!
//! # Inspect and undo
//! cleanup-lite recycle list ~/Downloads
//! cleanup-lite recycle restore ~/Downloads --all
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::scanner::HashAlgorithm;

/// Find large files and duplicates, and clean them up reversibly.
///
/// Files are never deleted directly: they are moved into a hidden
/// `.cleanup_recycle` directory under the scanned root, from where they can
/// be restored or purged.
#[derive(Debug, Parser)]
#[command(name = "cleanup-lite")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors and results
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List files at or above a size threshold
    Large(LargeArgs),
    /// Find groups of files with identical content
    Dupes(DupesArgs),
    /// Manage the recycle area of a root directory
    #[command(subcommand)]
    Recycle(RecycleCommand),
    /// Show the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the large subcommand.
#[derive(Debug, Args)]
pub struct LargeArgs {
    /// Directory to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Size threshold (e.g., 50MB, 1GiB); defaults to the configured value
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Descend into symlinked directories
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the dupes subcommand.
#[derive(Debug, Args)]
pub struct DupesArgs {
    /// Directory to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Only consider files of at least this size
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Number of hashing threads
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub io_threads: Option<u16>,

    /// Hash a size bucket early once it holds this many files
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub bucket_cap: Option<u32>,

    /// Read chunk size used while hashing
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub chunk_size: Option<u64>,

    /// Digest algorithm
    #[arg(long, value_enum)]
    pub algorithm: Option<HashAlgorithm>,

    /// Descend into symlinked directories
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Keep the first file of every group and recycle the others
    #[arg(long)]
    pub recycle_extras: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Recycle area subcommands.
#[derive(Debug, Subcommand)]
pub enum RecycleCommand {
    /// List recycled items and their original locations
    List {
        /// Root directory owning the recycle area
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },
    /// Move files or directories into the recycle area
    Move {
        /// Root directory owning the recycle area
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Items to recycle
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
    },
    /// Move recycled items back to where they came from
    Restore(RecycleTargets),
    /// Permanently delete recycled items
    Purge(RecycleTargets),
}

/// Items addressed by restore and purge.
#[derive(Debug, Args)]
pub struct RecycleTargets {
    /// Root directory owning the recycle area
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Recycled items, as paths or as names inside the recycle area
    #[arg(value_name = "RECYCLED", required_unless_present = "all", conflicts_with = "all")]
    pub items: Vec<PathBuf>,

    /// Apply to every item in the manifest
    #[arg(long)]
    pub all: bool,
}

/// Arguments for the config subcommand.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Write the default configuration file if none exists
    #[arg(long)]
    pub init: bool,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use cleanup_lite::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("50MiB").unwrap(), 52_428_800);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1 << 10,
        "MB" | "M" => 1_000_000,
        "MIB" => 1 << 20,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1 << 30,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1 << 40,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    // Whole numbers stay exact; fractions go through f64.
    if let Ok(whole) = num_str.parse::<u64>() {
        return whole
            .checked_mul(multiplier)
            .ok_or_else(|| format!("Size too large: '{s}'"));
    }

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;
    Ok((num * multiplier as f64) as u64)
}
