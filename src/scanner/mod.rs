//! Scanner module for directory traversal and content hashing.
//!
//! This module provides functionality for:
//! - Directory walking with depth, filesystem and pattern filters
//! - Partial fingerprinting and full checksumming with BLAKE3
//! - Capturing the (device, inode) identity needed for hard-link detection
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: BLAKE3 fingerprint and checksum computation
//!
//! # Example
//!
//! ```no_run
//! use dupelint::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let config = WalkerConfig {
//!     roots: vec![PathBuf::from(".")],
//!     skip_hidden: true,
//!     ..Default::default()
//! };
//!
//! let outcome = Walker::new(config).walk();
//! for record in &outcome.records {
//!     println!("{}: {} bytes", record.path.display(), record.size);
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::{Path, PathBuf};

use regex::Regex;

// Re-export main types
pub use hasher::{digest_to_hex, Digest, Fingerprint, HashError, Hasher};
pub use walker::{WalkOutcome, Walker};

/// Why a record entered the working set.
///
/// Mirrors the reason codes reported by the walker: ordinary regular files,
/// zero-byte files (trivially identical to each other), and placeholders
/// emitted where symlink-following ran into a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A regular file with content to compare.
    Regular,
    /// A zero-byte file. Skips hashing entirely.
    Empty,
    /// A placeholder for a symlink cycle encountered during traversal.
    SymlinkLoop,
}

/// One discovered file: its identity plus the digests computed by the
/// filter stages.
///
/// The size is fixed at discovery time and never re-read. The (device,
/// inode) pair identifies the physical file for hard-link collapsing only;
/// it is never used as a proxy for content equality.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes, immutable once recorded
    pub size: u64,
    /// Device identifier (0 where the platform provides none)
    pub dev: u64,
    /// Inode number (0 where the platform provides none)
    pub inode: u64,
    /// Discovery reason code
    pub kind: FileKind,
    /// Partial head/tail fingerprint, filled in by the fingerprint filter
    pub fingerprint: Option<Fingerprint>,
    /// Full content checksum, filled in by the checksum confirmer
    pub checksum: Option<Digest>,
    /// Still a duplicate candidate? Cleared when a filter pass finds a peer.
    pub candidate: bool,
    /// Duplicate-cluster tag assigned during final confirmation
    pub cluster: Option<usize>,
}

impl FileRecord {
    /// Create a record from already-known metadata.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, dev: u64, inode: u64) -> Self {
        let kind = if size == 0 {
            FileKind::Empty
        } else {
            FileKind::Regular
        };
        Self {
            path,
            size,
            dev,
            inode,
            kind,
            fingerprint: None,
            checksum: None,
            candidate: true,
            cluster: None,
        }
    }

    /// Create a record by stat-ing `path`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be stat-ed.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        let (dev, inode) = inode_identity(&meta);
        Ok(Self::new(path.to_path_buf(), meta.len(), dev, inode))
    }

    /// Sort key clustering records by physical location on disk.
    ///
    /// Same-inode records become adjacent, which the hard-link collapser
    /// relies on, and nearby inodes stay nearby, which keeps the hashing
    /// stages reading the disk roughly sequentially.
    #[must_use]
    pub fn locality_key(&self) -> (u64, u64) {
        (self.dev, self.inode)
    }

    /// Whether two records are different paths to the same physical file.
    #[must_use]
    pub fn same_inode(&self, other: &Self) -> bool {
        self.dev == other.dev && self.inode == other.inode
    }
}

/// Extract the (device, inode) pair from file metadata.
#[cfg(unix)]
pub fn inode_identity(meta: &std::fs::Metadata) -> (u64, u64) {
    use std::os::unix::fs::MetadataExt;
    (meta.dev(), meta.ino())
}

/// Extract the (device, inode) pair from file metadata.
///
/// On platforms without a stable inode notion every file reports (0, 0),
/// which disables hard-link collapsing but keeps the rest of the pipeline
/// working.
#[cfg(not(unix))]
pub fn inode_identity(_meta: &std::fs::Metadata) -> (u64, u64) {
    (0, 0)
}

/// Configuration for directory walking.
///
/// Controls traversal depth, symlink policy, filesystem boundaries and the
/// basename filters applied to files and directories.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Root paths to walk. More than one root makes hard-link collapsing
    /// necessary, since the same physical file may be reachable twice.
    pub roots: Vec<PathBuf>,

    /// Maximum recursion depth below each root. `None` means unlimited.
    pub max_depth: Option<usize>,

    /// Follow symbolic links during traversal. Cycles are reported as
    /// placeholder records rather than aborting the walk.
    pub follow_symlinks: bool,

    /// Do not cross filesystem boundaries below a root.
    pub same_file_system: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Keep only files whose basename matches this pattern.
    pub file_filter: Option<Regex>,

    /// Descend only into directories whose basename matches this pattern.
    pub dir_filter: Option<Regex>,

    /// Invert both basename filters.
    pub invert_match: bool,
}

impl WalkerConfig {
    /// Whether the walk can surface the same physical file under more than
    /// one path, making the hard-link collapse pass worthwhile.
    #[must_use]
    pub fn needs_physical_collapse(&self) -> bool {
        self.roots.len() > 1 || self.follow_symlinks
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
