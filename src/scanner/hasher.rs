//! Chunked, cancellable content hashing.
//!
//! Files are read in fixed-size chunks (1 MiB by default) and fed into an
//! incremental digest, so memory use does not grow with file size. Stop and
//! pause are checked before every chunk read: a stop mid-file abandons the
//! file with [`HashError::Interrupted`] and no digest.
//!
//! SHA-256 is the default algorithm; BLAKE3 is available when speed matters
//! more than matching digests produced elsewhere.
//!
//! # Example
//!
//! ```no_run
//! use cleanup_lite::control::ScanControl;
//! use cleanup_lite::scanner::{hash_to_hex, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new().with_control(ScanControl::new());
//! if let Some(digest) = hasher.hash_file(Path::new("movie.mkv")) {
//!     println!("{}", hash_to_hex(&digest));
//! }
//! ```

use std::fmt::Write as _;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::HashError;
use crate::control::ScanControl;

/// A 256-bit content digest.
pub type Hash = [u8; 32];

/// Default chunk size for streaming reads (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Digest algorithm used for content comparison.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256
    #[default]
    Sha256,
    /// BLAKE3
    Blake3,
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithm::Sha256 => write!(f, "sha256"),
            HashAlgorithm::Blake3 => write!(f, "blake3"),
        }
    }
}

enum DigestState {
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl DigestState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize(self) -> Hash {
        match self {
            Self::Sha256(h) => h.finalize().into(),
            Self::Blake3(h) => *h.finalize().as_bytes(),
        }
    }
}

/// Outcome of hashing one file.
///
/// `digest` is `None` when the file could not be read or hashing was
/// interrupted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashResult {
    /// Path that was hashed
    pub path: PathBuf,
    /// Content digest, if the file was read to the end
    pub digest: Option<Hash>,
}

/// Streaming file hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    chunk_size: usize,
    control: Option<ScanControl>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// SHA-256 hasher with 1 MiB chunks and no control attached.
    #[must_use]
    pub fn new() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            control: None,
        }
    }

    /// Select the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the read chunk size in bytes. Zero is treated as one.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Attach a control checked before every chunk.
    #[must_use]
    pub fn with_control(mut self, control: ScanControl) -> Self {
        self.control = Some(control);
        self
    }

    /// The configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The configured chunk size.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn may_continue(&self) -> bool {
        self.control.as_ref().map_or(true, ScanControl::checkpoint)
    }

    /// Hash the entire content of a file.
    ///
    /// # Errors
    ///
    /// - [`HashError::NotFound`] / [`HashError::PermissionDenied`] / [`HashError::Io`]
    ///   when the file cannot be opened or read
    /// - [`HashError::Interrupted`] when a stop is requested before the last chunk
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut state = DigestState::new(self.algorithm);
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            if !self.may_continue() {
                log::trace!("Hashing interrupted: {}", path.display());
                return Err(HashError::Interrupted(path.to_path_buf()));
            }

            let n = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };
            state.update(&buffer[..n]);
        }

        Ok(state.finalize())
    }

    /// Hash a file, collapsing every failure to `None`.
    ///
    /// Failures other than interruption are logged at debug level.
    #[must_use]
    pub fn hash_file(&self, path: &Path) -> Option<Hash> {
        match self.full_hash(path) {
            Ok(digest) => Some(digest),
            Err(HashError::Interrupted(_)) => None,
            Err(e) => {
                log::debug!("Could not hash {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Hash a file and pair the outcome with its path.
    #[must_use]
    pub fn hash_result(&self, path: PathBuf) -> HashResult {
        let digest = self.hash_file(&path);
        HashResult { path, digest }
    }

    /// Hash an in-memory buffer with the configured algorithm.
    #[must_use]
    pub fn hash_bytes(&self, data: &[u8]) -> Hash {
        let mut state = DigestState::new(self.algorithm);
        state.update(data);
        state.finalize()
    }
}

/// Render a digest as lowercase hex.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    let mut out = String::with_capacity(64);
    for byte in hash {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Parse a 64-character hex string back into a digest.
#[must_use]
pub fn hex_to_hash(hex: &str) -> Option<Hash> {
    if hex.len() != 64 || !hex.is_ascii() {
        return None;
    }
    let mut hash = [0u8; 32];
    for (i, byte) in hash.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SHA256_HELLO: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
    const SHA256_EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const BLAKE3_HELLO: &str = "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24";

    #[test]
    fn test_sha256_known_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hello.txt");
        fs::write(&path, "hello world").unwrap();

        let digest = Hasher::new().full_hash(&path).unwrap();
        assert_eq!(hash_to_hex(&digest), SHA256_HELLO);
    }

    #[test]
    fn test_empty_file_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty");
        fs::write(&path, "").unwrap();

        let digest = Hasher::new().full_hash(&path).unwrap();
        assert_eq!(hash_to_hex(&digest), SHA256_EMPTY);
    }

    #[test]
    fn test_blake3_known_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hello.txt");
        fs::write(&path, "hello world").unwrap();

        let hasher = Hasher::new().with_algorithm(HashAlgorithm::Blake3);
        assert_eq!(hash_to_hex(&hasher.full_hash(&path).unwrap()), BLAKE3_HELLO);
    }

    #[test]
    fn test_chunk_size_does_not_change_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();

        let whole = Hasher::new().hash_bytes(&data);
        for chunk in [1, 7, 4096, DEFAULT_CHUNK_SIZE] {
            let digest = Hasher::new().with_chunk_size(chunk).full_hash(&path).unwrap();
            assert_eq!(digest, whole, "chunk size {chunk}");
        }
    }

    #[test]
    fn test_zero_chunk_size_is_clamped() {
        assert_eq!(Hasher::new().with_chunk_size(0).chunk_size(), 1);
    }

    #[test]
    fn test_missing_file() {
        let hasher = Hasher::new();
        let path = Path::new("/nonexistent/file.bin");

        assert!(matches!(hasher.full_hash(path), Err(HashError::NotFound(_))));
        assert!(hasher.hash_file(path).is_none());
    }

    #[test]
    fn test_directory_is_not_hashable() {
        let dir = TempDir::new().unwrap();
        assert!(Hasher::new().hash_file(dir.path()).is_none());
    }

    #[test]
    fn test_stop_interrupts_hashing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, vec![0u8; 64 * 1024]).unwrap();

        let control = ScanControl::new();
        control.request_stop();
        let hasher = Hasher::new().with_chunk_size(1024).with_control(control);

        assert!(matches!(
            hasher.full_hash(&path),
            Err(HashError::Interrupted(_))
        ));
        assert!(hasher.hash_file(&path).is_none());
    }

    #[test]
    fn test_pause_before_first_chunk_blocks_reads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, b"first part ").unwrap();

        let control = ScanControl::new();
        control.pause();
        let hasher = Hasher::new().with_chunk_size(4).with_control(control.clone());
        let worker = {
            let path = path.clone();
            std::thread::spawn(move || hasher.full_hash(&path))
        };

        std::thread::sleep(std::time::Duration::from_millis(100));
        assert!(!worker.is_finished());

        // Content added while paused is seen, so nothing was read yet.
        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        std::io::Write::write_all(&mut file, b"second part").unwrap();
        drop(file);

        control.resume();
        let digest = worker.join().unwrap().unwrap();
        assert_eq!(digest, Hasher::new().hash_bytes(b"first part second part"));
    }

    #[test]
    fn test_pause_mid_file_holds_until_resume() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        let data: Vec<u8> = (0..2 * 1024 * 1024u32).map(|i| (i % 253) as u8).collect();
        fs::write(&path, &data).unwrap();

        let control = ScanControl::new();
        let hasher = Hasher::new().with_chunk_size(1).with_control(control.clone());
        let worker = {
            let path = path.clone();
            std::thread::spawn(move || hasher.full_hash(&path))
        };

        std::thread::sleep(std::time::Duration::from_millis(10));
        control.pause();
        std::thread::sleep(std::time::Duration::from_millis(300));
        let held = !worker.is_finished();

        control.resume();
        let digest = worker.join().unwrap().unwrap();
        assert_eq!(digest, Hasher::new().hash_bytes(&data));
        assert!(held, "hashing finished while paused");
    }

    #[test]
    fn test_hash_result_pairs_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "hello world").unwrap();

        let result = Hasher::new().hash_result(path.clone());
        assert_eq!(result.path, path);
        assert_eq!(result.digest.map(|d| hash_to_hex(&d)).as_deref(), Some(SHA256_HELLO));
    }

    #[test]
    fn test_hex_conversion() {
        let digest = hex_to_hash(SHA256_HELLO).unwrap();
        assert_eq!(hash_to_hex(&digest), SHA256_HELLO);

        assert!(hex_to_hash("abc").is_none());
        assert!(hex_to_hash(&"zz".repeat(32)).is_none());
    }

    #[test]
    fn test_algorithm_display_and_serde() {
        assert_eq!(HashAlgorithm::Sha256.to_string(), "sha256");
        assert_eq!(HashAlgorithm::Blake3.to_string(), "blake3");
        assert_eq!(
            serde_json::to_string(&HashAlgorithm::Blake3).unwrap(),
            "\"blake3\""
        );
        assert_eq!(HashAlgorithm::default(), HashAlgorithm::Sha256);
    }
}
