//! The duplicate-detection engine.
//!
//! # Overview
//!
//! The engine narrows a flat set of discovered file records down to
//! confirmed duplicate clusters through successively more expensive
//! filters:
//!
//! 1. **Partition** ([`partition`]): one sort, one scan — exact-size
//!    groups; singletons and empty files retired without any I/O.
//! 2. **Per group**, under the [`scheduler`]: hard-link collapse, then the
//!    head/tail fingerprint filter, then full-checksum confirmation
//!    ([`filter`]).
//! 3. **Aggregate** ([`summary`]): per-group outcomes reduced into the
//!    cluster list and run totals after all workers join.
//!
//! # Example
//!
//! ```no_run
//! use dupelint::config::EngineConfig;
//! use dupelint::engine::Engine;
//! use dupelint::scanner::FileRecord;
//! use dupelint::signal::CancelToken;
//!
//! let records: Vec<FileRecord> = Vec::new(); // from the walker
//! let engine = Engine::new(EngineConfig::default(), CancelToken::new());
//!
//! let report = engine.run(records).unwrap();
//! println!(
//!     "{} duplicate(s), {} reclaimable",
//!     report.summary.duplicate_files,
//!     report.summary.reclaimable_display()
//! );
//! ```

pub mod filter;
pub mod group;
pub mod partition;
pub mod scheduler;
pub mod summary;

pub use filter::{confirm_checksums, fingerprint_filter, fingerprint_sample_size};
pub use group::{GroupOutcome, SizeGroup};
pub use partition::{partition_by_size, Partition, PartitionStats};
pub use summary::{DuplicateCluster, ScanSummary};

use crate::config::EngineConfig;
use crate::scanner::{FileRecord, Hasher};
use crate::signal::CancelToken;

/// Errors that end a run early.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// The run was interrupted by the user.
    #[error("Scan interrupted by user")]
    Interrupted,
}

/// Everything one run produced.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Confirmed duplicate clusters across all groups
    pub clusters: Vec<DuplicateCluster>,
    /// Aggregate counters for reporting
    pub summary: ScanSummary,
}

/// The pipeline orchestrator: owns the hasher, the worker pool and the
/// run configuration.
pub struct Engine {
    config: EngineConfig,
    hasher: Hasher,
    cancel: CancelToken,
    pool: Option<rayon::ThreadPool>,
}

impl Engine {
    /// Build an engine, starting its worker pool.
    ///
    /// A pool that cannot be started is a hard warning, not a fatal
    /// error: the engine degrades to hashing everything on the calling
    /// thread.
    #[must_use]
    pub fn new(config: EngineConfig, cancel: CancelToken) -> Self {
        let pool = if config.workers > 1 {
            let built = rayon::ThreadPoolBuilder::new()
                .num_threads(config.workers)
                .thread_name(|i| format!("dupelint-worker-{i}"))
                .build();
            match built {
                Ok(pool) => Some(pool),
                Err(err) => {
                    log::error!("could not start worker pool ({err}); hashing synchronously");
                    None
                }
            }
        } else {
            None
        };

        Self {
            config,
            hasher: Hasher::new(),
            cancel,
            pool,
        }
    }

    /// Split records into exact-size groups without running the filter
    /// pipeline. Useful on its own for diagnostic group listings.
    #[must_use]
    pub fn partition(&self, records: Vec<FileRecord>) -> Partition {
        partition_by_size(records, self.config.collapse_physical)
    }

    /// Run the full pipeline over a discovered record set.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Interrupted`] when the user interrupted the
    /// run; everything confirmed so far is discarded in favor of a prompt
    /// unwind.
    pub fn run(&self, records: Vec<FileRecord>) -> Result<ScanReport, EngineError> {
        let mut partition = self.partition(records);
        if self.cancel.checkpoint() {
            return Err(EngineError::Interrupted);
        }

        log::info!("sorting groups by their location on the drive");
        scheduler::run_groups(
            &mut partition.groups,
            &self.config,
            &self.hasher,
            self.pool.as_ref(),
            &self.cancel,
        );
        if self.cancel.checkpoint() {
            return Err(EngineError::Interrupted);
        }

        let (clusters, summary) = summary::aggregate(&mut partition.groups, &partition.stats);
        log::info!(
            "{} of {} input file(s) are redundant ({} reclaimable)",
            summary.duplicate_files,
            summary.input_files,
            summary.reclaimable_display()
        );

        Ok(ScanReport { clusters, summary })
    }
}
