//! Engine tuning knobs and their defaults.

/// Largest sample read from each end of a file for fingerprinting.
///
/// Whatever the file size, fingerprinting never reads more than twice this
/// many bytes.
pub const DEFAULT_FINGERPRINT_CAP: u64 = 4 * 1024;

/// Smallest fingerprint sample. Below this the digest discriminates too
/// poorly to be worth a separate read.
pub const MIN_FINGERPRINT_SAMPLE: u64 = 64;

/// Fingerprint sample size as a fraction of file size: size / this.
pub const FINGERPRINT_DIVISOR: u64 = 16;

/// Group byte size above which the checksum stage splits a group's records
/// across workers instead of hashing in place.
pub const DEFAULT_CHUNK_THRESHOLD: u64 = 4 * 1024 * 1024;

/// Group byte size a group must exceed before the scheduler dispatches it
/// to a worker at all; smaller groups run inline, where thread overhead
/// would dominate the work.
pub const DEFAULT_DISPATCH_THRESHOLD: u64 = 512 * 1024;

/// Configuration for the duplicate-detection engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of worker threads. 1 disables all parallel dispatch.
    pub workers: usize,
    /// Fingerprint sample cap in bytes.
    pub fingerprint_cap: u64,
    /// Checksum chunk-parallelism threshold in bytes.
    pub chunk_threshold: u64,
    /// Scheduler dispatch threshold in bytes.
    pub dispatch_threshold: u64,
    /// Run the hard-link collapse pass. Only worthwhile when the traversal
    /// could reach one physical file through several paths.
    pub collapse_physical: bool,
    /// Submit every eligible group at once instead of joining batches.
    /// Higher peak resource use; experimental, never the default.
    pub eager_scheduler: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            fingerprint_cap: DEFAULT_FINGERPRINT_CAP,
            chunk_threshold: DEFAULT_CHUNK_THRESHOLD,
            dispatch_threshold: DEFAULT_DISPATCH_THRESHOLD,
            collapse_physical: false,
            eager_scheduler: false,
        }
    }
}

impl EngineConfig {
    /// Set the worker count, clamped to at least one.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Enable or disable the hard-link collapse pass.
    #[must_use]
    pub fn with_physical_collapse(mut self, enabled: bool) -> Self {
        self.collapse_physical = enabled;
        self
    }

    /// Set the fingerprint sample cap.
    #[must_use]
    pub fn with_fingerprint_cap(mut self, cap: u64) -> Self {
        self.fingerprint_cap = cap.max(MIN_FINGERPRINT_SAMPLE);
        self
    }
}
