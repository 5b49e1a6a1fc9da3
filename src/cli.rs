//! Command-line interface definitions.
//!
//! All CLI arguments are defined here with the clap derive API, together
//! with the conversions into the walker and engine configurations.
//!
//! # Example
//!
//! ```bash
//! # Find duplicates under two directories
//! dupelint ~/photos /mnt/backup/photos
//!
//! # Only compare .jpg files, case-insensitively, four workers
//! dupelint -i -p '\.jpg$' -t 4 ~/photos
//!
//! # Just list the equal-size groups and exit
//! dupelint --dump groups ~/photos
//! ```

use clap::{Parser, ValueEnum};
use regex::{Regex, RegexBuilder};
use std::path::PathBuf;

use crate::config::{EngineConfig, MIN_FINGERPRINT_SAMPLE};
use crate::scanner::WalkerConfig;

/// Duplicate file finder.
///
/// dupelint narrows same-size files down through a cheap head/tail
/// fingerprint to full BLAKE3 checksums, and reports the confirmed
/// duplicates together with the space they waste.
#[derive(Debug, Parser)]
#[command(name = "dupelint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directories to scan for duplicates
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Maximum recursion depth below each root
    #[arg(short = 'd', long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Follow symbolic links during the scan
    ///
    /// Symlink cycles are reported instead of looping forever.
    #[arg(short = 'f', long)]
    pub follow_symlinks: bool,

    /// Stay on the filesystem each root starts on
    #[arg(long)]
    pub same_filesystem: bool,

    /// Skip hidden files and directories (names starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Only consider files whose name matches this regular expression
    #[arg(short = 'p', long, value_name = "REGEX")]
    pub pattern: Option<String>,

    /// Only descend into directories whose name matches this regular expression
    #[arg(short = 'D', long, value_name = "REGEX")]
    pub dir_pattern: Option<String>,

    /// Match both patterns case-insensitively
    #[arg(short = 'i', long)]
    pub ignore_case: bool,

    /// Invert both patterns
    #[arg(short = 'I', long)]
    pub invert_match: bool,

    /// Number of worker threads (default: one per logical CPU)
    #[arg(short = 't', long, value_name = "N")]
    pub threads: Option<usize>,

    /// Largest sample read from each end of a file for fingerprinting
    /// (accepts suffixes like 4KiB, 1MB; default 4 KiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size, default_value = "4096")]
    pub fingerprint_cap: u64,

    /// Group byte size a group must exceed to be worth a worker thread
    /// (default 512 KiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size, default_value = "524288")]
    pub parallel_threshold: u64,

    /// Group byte size above which checksum work is split across workers
    /// (default 4 MiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size, default_value = "4194304")]
    pub chunk_threshold: u64,

    /// Print a diagnostic listing and exit without confirming duplicates
    #[arg(long, value_enum, value_name = "WHAT")]
    pub dump: Option<DumpMode>,

    /// Write confirmed clusters and the summary to this file as JSON
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Dispatch every large group at once instead of in joined batches
    ///
    /// Unstable: peak memory and I/O pressure can spike. The default
    /// batched discipline is recommended.
    #[arg(long)]
    pub unstable_eager_scheduler: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Diagnostic listings that short-circuit the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DumpMode {
    /// Files sharing a basename, before any grouping
    Basenames,
    /// Equal-size groups, after partitioning
    Groups,
}

impl Cli {
    /// Build the traversal configuration, compiling the basename filters.
    ///
    /// A malformed pattern is reported once and disabled rather than
    /// failing the run.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        // Absolute roots make every record path absolute; a root that
        // cannot be resolved is left as-is and surfaces as a walk error.
        let roots = self
            .paths
            .iter()
            .map(|p| std::fs::canonicalize(p).unwrap_or_else(|_| p.clone()))
            .collect();

        WalkerConfig {
            roots,
            max_depth: self.max_depth,
            follow_symlinks: self.follow_symlinks,
            same_file_system: self.same_filesystem,
            skip_hidden: self.skip_hidden,
            file_filter: compile_filter(self.pattern.as_deref(), self.ignore_case, "file"),
            dir_filter: compile_filter(self.dir_pattern.as_deref(), self.ignore_case, "directory"),
            invert_match: self.invert_match,
        }
    }

    /// Build the engine configuration.
    #[must_use]
    pub fn engine_config(&self, walker: &WalkerConfig) -> EngineConfig {
        EngineConfig {
            workers: self.threads.unwrap_or_else(num_cpus::get).max(1),
            fingerprint_cap: self.fingerprint_cap.max(MIN_FINGERPRINT_SAMPLE),
            chunk_threshold: self.chunk_threshold,
            dispatch_threshold: self.parallel_threshold,
            collapse_physical: walker.needs_physical_collapse(),
            eager_scheduler: self.unstable_eager_scheduler,
        }
    }
}

/// Compile one basename filter; a bad pattern warns and disables itself.
fn compile_filter(pattern: Option<&str>, ignore_case: bool, what: &str) -> Option<Regex> {
    let pattern = pattern?;
    match RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .build()
    {
        Ok(re) => Some(re),
        Err(err) => {
            log::warn!("invalid {what} pattern '{pattern}' disabled: {err}");
            None
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Accepts plain byte counts and the usual suffixes (KB, KiB, MB, MiB, ...).
pub fn parse_size(input: &str) -> Result<u64, String> {
    input
        .parse::<bytesize::ByteSize>()
        .map(|size| size.0)
        .map_err(|err| format!("invalid size '{input}': {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_minimal_invocation() {
        let cli = Cli::parse_from(["dupelint", "/tmp"]);
        assert_eq!(cli.paths, vec![PathBuf::from("/tmp")]);
        assert!(cli.threads.is_none());
        assert!(cli.dump.is_none());
        assert!(!cli.unstable_eager_scheduler);
    }

    #[test]
    fn test_parse_size_suffixes() {
        assert_eq!(parse_size("1024").unwrap(), 1024);
        assert_eq!(parse_size("4KiB").unwrap(), 4096);
        assert_eq!(parse_size("1MiB").unwrap(), 1024 * 1024);
        assert!(parse_size("one-mega").is_err());
    }

    #[test]
    fn test_multi_root_enables_physical_collapse() {
        let cli = Cli::parse_from(["dupelint", "/a", "/b"]);
        let walker = cli.walker_config();
        let engine = cli.engine_config(&walker);
        assert!(engine.collapse_physical);

        let cli = Cli::parse_from(["dupelint", "/a"]);
        let walker = cli.walker_config();
        let engine = cli.engine_config(&walker);
        assert!(!engine.collapse_physical);
    }

    #[test]
    fn test_follow_symlinks_enables_physical_collapse() {
        let cli = Cli::parse_from(["dupelint", "--follow-symlinks", "/a"]);
        let walker = cli.walker_config();
        assert!(cli.engine_config(&walker).collapse_physical);
    }

    #[test]
    fn test_invalid_pattern_is_disabled_not_fatal() {
        let cli = Cli::parse_from(["dupelint", "-p", "(unclosed", "/a"]);
        let walker = cli.walker_config();
        assert!(walker.file_filter.is_none());
    }

    #[test]
    fn test_dump_mode_parsing() {
        let cli = Cli::parse_from(["dupelint", "--dump", "groups", "/a"]);
        assert_eq!(cli.dump, Some(DumpMode::Groups));

        let cli = Cli::parse_from(["dupelint", "--dump", "basenames", "/a"]);
        assert_eq!(cli.dump, Some(DumpMode::Basenames));
    }

    #[test]
    fn test_zero_threads_clamped() {
        let cli = Cli::parse_from(["dupelint", "-t", "0", "/a"]);
        let walker = cli.walker_config();
        assert_eq!(cli.engine_config(&walker).workers, 1);
    }
}
