//! Directory walker producing the engine's initial record stream.
//!
//! # Overview
//!
//! Walks one or more root paths with [`walkdir`], applying depth limits,
//! hidden-file skipping, filesystem boundaries and basename filters, and
//! emits one [`FileRecord`] per regular file. Symlink cycles encountered
//! while following links become placeholder records instead of aborting
//! the walk.
//!
//! Traversal errors never abort a run: each is surfaced once and the walk
//! continues with the remaining entries.

use std::path::Path;

use walkdir::{DirEntry, WalkDir};

use crate::signal::CancelToken;

use super::{inode_identity, FileKind, FileRecord, ScanError, WalkerConfig};

/// Everything a walk produced: the record stream plus the errors that were
/// tolerated along the way.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    /// Discovered records, in traversal order
    pub records: Vec<FileRecord>,
    /// Non-fatal traversal errors
    pub errors: Vec<ScanError>,
    /// True when the walk was cut short by an interrupt
    pub interrupted: bool,
}

/// Directory walker for file discovery.
#[derive(Debug)]
pub struct Walker {
    config: WalkerConfig,
    cancel: Option<CancelToken>,
}

impl Walker {
    /// Create a new walker over the configured roots.
    #[must_use]
    pub fn new(config: WalkerConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Attach a cancellation token, checked once per directory entry.
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Walk all roots and collect the discovered records.
    #[must_use]
    pub fn walk(&self) -> WalkOutcome {
        let mut outcome = WalkOutcome::default();

        'roots: for root in &self.config.roots {
            let mut walk = WalkDir::new(root).follow_links(self.config.follow_symlinks);
            if let Some(depth) = self.config.max_depth {
                walk = walk.max_depth(depth);
            }
            if self.config.same_file_system {
                walk = walk.same_file_system(true);
            }

            let mut iter = walk.into_iter();
            loop {
                if self.check_interrupted() {
                    outcome.interrupted = true;
                    break 'roots;
                }

                let entry = match iter.next() {
                    None => break,
                    Some(Ok(entry)) => entry,
                    Some(Err(err)) => {
                        self.note_walk_error(err, &mut outcome);
                        continue;
                    }
                };

                if entry.file_type().is_dir() {
                    if entry.depth() > 0 && !self.descend_into(&entry) {
                        iter.skip_current_dir();
                    }
                    continue;
                }

                if let Some(record) = self.file_record(&entry, &mut outcome) {
                    outcome.records.push(record);
                }
            }
        }

        log::debug!(
            "walk finished: {} records, {} errors",
            outcome.records.len(),
            outcome.errors.len()
        );
        outcome
    }

    fn check_interrupted(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.checkpoint())
    }

    /// Whether traversal should descend into a directory entry.
    fn descend_into(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();

        if self.config.skip_hidden && name.starts_with('.') {
            return false;
        }
        self.basename_passes(&name, self.config.dir_filter.as_ref())
    }

    /// Build a record for a non-directory entry, or `None` if filtered out.
    fn file_record(&self, entry: &DirEntry, outcome: &mut WalkOutcome) -> Option<FileRecord> {
        if !entry.file_type().is_file() {
            // Sockets, fifos, device nodes and unfollowed symlinks carry
            // no comparable content.
            return None;
        }

        let name = entry.file_name().to_string_lossy();
        if self.config.skip_hidden && name.starts_with('.') {
            return None;
        }
        if !self.basename_passes(&name, self.config.file_filter.as_ref()) {
            return None;
        }

        match entry.metadata() {
            Ok(meta) => {
                let (dev, inode) = inode_identity(&meta);
                Some(FileRecord::new(
                    entry.path().to_path_buf(),
                    meta.len(),
                    dev,
                    inode,
                ))
            }
            Err(err) => {
                let path = entry.path().to_path_buf();
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("metadata unavailable"));
                log::warn!("cannot stat {}: {}", path.display(), source);
                outcome.errors.push(ScanError::Io { path, source });
                None
            }
        }
    }

    /// Apply a basename filter, honoring the inverted-match mode. A missing
    /// filter always passes.
    fn basename_passes(&self, name: &str, filter: Option<&regex::Regex>) -> bool {
        match filter {
            None => true,
            Some(re) => re.is_match(name) != self.config.invert_match,
        }
    }

    /// Record a traversal error. Symlink cycles become placeholder records
    /// so the report can name them; everything else is kept as a warning.
    fn note_walk_error(&self, err: walkdir::Error, outcome: &mut WalkOutcome) {
        if let Some(ancestor) = err.loop_ancestor() {
            let path = err
                .path()
                .unwrap_or(ancestor)
                .to_path_buf();
            log::warn!(
                "symlink cycle at {} (loops back to {})",
                path.display(),
                ancestor.display()
            );
            let mut record = FileRecord::new(path, 0, 0, 0);
            record.kind = FileKind::SymlinkLoop;
            outcome.records.push(record);
            return;
        }

        let path = err
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let scan_err = match err.io_error().map(std::io::Error::kind) {
            Some(std::io::ErrorKind::PermissionDenied) => ScanError::PermissionDenied(path),
            Some(std::io::ErrorKind::NotFound) => ScanError::NotFound(path),
            _ => ScanError::Io {
                path,
                source: err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("walk error")),
            },
        };
        log::warn!("{scan_err}");
        outcome.errors.push(scan_err);
    }
}
