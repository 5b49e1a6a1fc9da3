//! BLAKE3 fingerprint and checksum computation.
//!
//! # Overview
//!
//! Two tiers of content digest back the duplicate filters:
//!
//! - A [`Fingerprint`]: digests of a bounded sample from the start and the
//!   end of the file. Cheap enough to compute for every candidate, strong
//!   enough to rule out most non-duplicates before any full read happens.
//! - A full [`Digest`] of the entire content, streamed through BLAKE3,
//!   used for final confirmation.
//!
//! Both tiers share the same 32-byte digest type, so comparison code does
//! not care which tier produced a value.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// A 32-byte BLAKE3 digest.
pub type Digest = [u8; 32];

/// Buffer size for streaming whole-file checksums.
const READ_BUF_SIZE: usize = 64 * 1024;

/// Partial content fingerprint: one digest over the first `sample` bytes
/// and one over the last `sample` bytes of a file.
///
/// For files shorter than twice the sample length the two windows overlap.
/// That loses discriminating power but never correctness: fingerprint
/// equality is only ever used to *keep* candidates for full checksumming,
/// so two files with equal fingerprints are still confirmed byte-for-byte
/// later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    /// Digest of the leading sample
    pub head: Digest,
    /// Digest of the trailing sample
    pub tail: Digest,
}

/// Errors that can occur while hashing file content.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file disappeared between discovery and hashing.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl HashError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

/// Streaming BLAKE3 hasher for fingerprints and full checksums.
#[derive(Debug, Default)]
pub struct Hasher {
    _private: (),
}

impl Hasher {
    /// Create a new hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the two-part fingerprint of `path`.
    ///
    /// Reads at most `2 * sample` bytes: the leading window and the
    /// trailing window of the file. `sample` must be non-zero; callers
    /// derive it from the file size via
    /// [`fingerprint_sample_size`](crate::engine::fingerprint_sample_size).
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or read, e.g.
    /// because it vanished or became unreadable after discovery.
    pub fn fingerprint(&self, path: &Path, sample: u64) -> Result<Fingerprint, HashError> {
        debug_assert!(sample > 0, "fingerprint sample must be non-zero");

        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let len = file
            .metadata()
            .map_err(|e| HashError::from_io(path, e))?
            .len();

        let mut buf = vec![0u8; sample.min(len).max(1) as usize];

        let head = Self::digest_window(&mut file, path, 0, &mut buf)?;
        let tail_start = len.saturating_sub(sample);
        let tail = Self::digest_window(&mut file, path, tail_start, &mut buf)?;

        Ok(Fingerprint { head, tail })
    }

    /// Stream the entire content of `path` through BLAKE3.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or a read
    /// fails partway through.
    pub fn checksum(&self, path: &Path) -> Result<Digest, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut hasher = blake3::Hasher::new();
        let mut buf = [0u8; READ_BUF_SIZE];

        loop {
            let n = file
                .read(&mut buf)
                .map_err(|e| HashError::from_io(path, e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }

        Ok(*hasher.finalize().as_bytes())
    }

    /// Digest one window of the file starting at `offset`.
    ///
    /// Short reads near EOF digest whatever was available; the window
    /// length is bounded by the caller's buffer.
    fn digest_window(
        file: &mut File,
        path: &Path,
        offset: u64,
        buf: &mut [u8],
    ) -> Result<Digest, HashError> {
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| HashError::from_io(path, e))?;

        let mut filled = 0;
        while filled < buf.len() {
            let n = file
                .read(&mut buf[filled..])
                .map_err(|e| HashError::from_io(path, e))?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        Ok(*blake3::hash(&buf[..filled]).as_bytes())
    }
}

/// Render a digest as lowercase hex, for logs and the JSON report.
#[must_use]
pub fn digest_to_hex(digest: &Digest) -> String {
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap().write_all(content).unwrap();
        path
    }

    #[test]
    fn test_checksum_matches_for_identical_content() {
        let dir = tempdir().unwrap();
        let a = write_file(dir.path(), "a", b"same content");
        let b = write_file(dir.path(), "b", b"same content");

        let hasher = Hasher::new();
        assert_eq!(
            hasher.checksum(&a).unwrap(),
            hasher.checksum(&b).unwrap()
        );
    }

    #[test]
    fn test_checksum_differs_for_different_content() {
        let dir = tempdir().unwrap();
        let a = write_file(dir.path(), "a", b"content one");
        let b = write_file(dir.path(), "b", b"content two");

        let hasher = Hasher::new();
        assert_ne!(
            hasher.checksum(&a).unwrap(),
            hasher.checksum(&b).unwrap()
        );
    }

    #[test]
    fn test_fingerprint_ignores_differences_outside_samples() {
        // Two files identical in their first and last kilobyte but
        // different in the middle must produce equal fingerprints; only
        // the full checksum may tell them apart.
        let dir = tempdir().unwrap();
        let one = vec![0xAAu8; 8192];
        let mut two = one.clone();
        two[4096] = 0xBB;

        let a = write_file(dir.path(), "a", &one);
        let b = write_file(dir.path(), "b", &two);

        let hasher = Hasher::new();
        let fa = hasher.fingerprint(&a, 1024).unwrap();
        let fb = hasher.fingerprint(&b, 1024).unwrap();
        assert_eq!(fa, fb);

        assert_ne!(
            hasher.checksum(&a).unwrap(),
            hasher.checksum(&b).unwrap()
        );
    }

    #[test]
    fn test_fingerprint_detects_tail_difference() {
        let dir = tempdir().unwrap();
        let one = vec![0x11u8; 4096];
        let mut two = one.clone();
        *two.last_mut().unwrap() = 0x22;

        let a = write_file(dir.path(), "a", &one);
        let b = write_file(dir.path(), "b", &two);

        let hasher = Hasher::new();
        let fa = hasher.fingerprint(&a, 256).unwrap();
        let fb = hasher.fingerprint(&b, 256).unwrap();

        assert_eq!(fa.head, fb.head);
        assert_ne!(fa.tail, fb.tail);
    }

    #[test]
    fn test_fingerprint_of_tiny_file_overlaps() {
        let dir = tempdir().unwrap();
        let a = write_file(dir.path(), "a", b"xy");

        let hasher = Hasher::new();
        let fp = hasher.fingerprint(&a, 1024).unwrap();

        // Sample window covers the whole file, so both halves coincide.
        assert_eq!(fp.head, fp.tail);
    }

    #[test]
    fn test_missing_file_reports_not_found() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("never-existed");

        let hasher = Hasher::new();
        assert!(matches!(
            hasher.checksum(&gone),
            Err(HashError::NotFound(_))
        ));
        assert!(matches!(
            hasher.fingerprint(&gone, 64),
            Err(HashError::NotFound(_))
        ));
    }

    #[test]
    fn test_digest_to_hex() {
        let mut digest = [0u8; 32];
        digest[0] = 0xAB;
        digest[31] = 0x01;

        let hex = digest_to_hex(&digest);
        assert_eq!(hex.len(), 64);
        assert!(hex.starts_with("ab"));
        assert!(hex.ends_with("01"));
    }
}
