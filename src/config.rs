//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. `config.toml` in the platform config directory
//! 3. `CLEANUP_*` environment variables (e.g. `CLEANUP_MIN_SIZE=1048576`)
//! 4. Command-line flags, applied by the caller
//!
//! A config file that cannot be read or parsed is ignored with a debug log.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::{FinderConfig, DEFAULT_BUCKET_CAP, DEFAULT_IO_THREADS};
use crate::scanner::{HashAlgorithm, WalkerConfig, DEFAULT_CHUNK_SIZE};

/// Default size threshold: 50 MiB.
pub const DEFAULT_MIN_SIZE: u64 = 50 * 1024 * 1024;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "CLEANUP_";

/// Errors that can occur while loading or saving configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// No platform configuration directory could be determined.
    #[error("Failed to determine the configuration directory")]
    NoConfigDir,

    /// A configuration layer could not be parsed.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] figment::Error),

    /// The configuration could not be serialized.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Reading or writing the configuration file failed.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Size threshold in bytes for large files and duplicate candidates.
    pub min_size: u64,
    /// Number of hashing workers.
    pub io_threads: usize,
    /// Soft cap on a size bucket before it is hashed early.
    pub bucket_cap: usize,
    /// Read chunk size for hashing, in bytes.
    pub chunk_size: usize,
    /// Digest algorithm.
    pub algorithm: HashAlgorithm,
    /// Descend into symlinked directories.
    pub follow_symlinks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            io_threads: DEFAULT_IO_THREADS,
            bucket_cap: DEFAULT_BUCKET_CAP,
            chunk_size: DEFAULT_CHUNK_SIZE,
            algorithm: HashAlgorithm::default(),
            follow_symlinks: false,
        }
    }
}

impl Config {
    /// Default platform-specific configuration file path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "cleanup-lite", "cleanup-lite")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Layered provider: defaults, then `file` if given, then environment.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load the configuration from the default platform-specific path.
    ///
    /// Falls back to defaults on any error.
    #[must_use]
    pub fn load() -> Self {
        let path = Self::config_path();
        match Self::figment(path.as_deref()).extract() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load the configuration with `path` as the file layer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if any layer fails to parse.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::figment(Some(path)).extract()?)
    }

    /// Save the configuration to the default platform-specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be determined or written.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save the configuration as TOML to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Walker settings derived from this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::default().with_follow_symlinks(self.follow_symlinks)
    }

    /// Duplicate finder settings derived from this configuration.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_min_size(self.min_size)
            .with_io_threads(self.io_threads)
            .with_bucket_cap(self.bucket_cap)
            .with_chunk_size(self.chunk_size)
            .with_algorithm(self.algorithm)
            .with_walker_config(self.walker_config())
    }
}
