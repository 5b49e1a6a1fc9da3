//! Final duplicate clusters and the run summary.

use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use serde::Serialize;

use crate::scanner::{digest_to_hex, Digest};

use super::group::SizeGroup;
use super::partition::PartitionStats;

/// A confirmed set of byte-identical files.
///
/// Paths keep the locality order of their group; by convention the first
/// path is the original and the rest are the redundant copies.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateCluster {
    /// Full content checksum shared by every member
    pub checksum: Digest,
    /// Byte size of each member
    pub file_size: u64,
    /// Member paths, original first
    pub paths: Vec<PathBuf>,
}

impl DuplicateCluster {
    /// Create an empty cluster for the given content identity.
    #[must_use]
    pub fn new(checksum: Digest, file_size: u64) -> Self {
        Self {
            checksum,
            file_size,
            paths: Vec::new(),
        }
    }

    /// The member conventionally kept.
    #[must_use]
    pub fn original(&self) -> Option<&Path> {
        self.paths.first().map(PathBuf::as_path)
    }

    /// The members conventionally removable.
    #[must_use]
    pub fn redundant(&self) -> &[PathBuf] {
        self.paths.get(1..).unwrap_or(&[])
    }

    /// Bytes freed by removing every redundant member.
    #[must_use]
    pub fn wasted_bytes(&self) -> u64 {
        self.file_size * self.paths.len().saturating_sub(1) as u64
    }

    /// Checksum as lowercase hex.
    #[must_use]
    pub fn checksum_hex(&self) -> String {
        digest_to_hex(&self.checksum)
    }
}

/// Aggregate result of one run, handed to reporting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    /// Files the traversal fed into the engine
    pub input_files: usize,
    /// Files proven non-duplicate and removed from consideration
    /// (singletons plus fingerprint and checksum evictions)
    pub removed_non_duplicates: usize,
    /// Redundant files across all groups (cluster members minus originals)
    pub duplicate_files: usize,
    /// Bytes freed if every redundant file were removed
    pub reclaimable_bytes: u64,
    /// Files retired at partition time for having a unique size
    pub singletons_removed: usize,
    /// Zero-byte files retired without hashing
    pub empty_files_removed: usize,
    /// Extra paths to physically identical files (hard links)
    pub hardlinks_collapsed: usize,
    /// Files skipped because their content could not be read
    pub unreadable_skipped: usize,
    /// Traversal errors tolerated during discovery
    pub traversal_errors: usize,
}

impl ScanSummary {
    /// Reclaimable bytes as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize(self.reclaimable_bytes).to_string()
    }
}

/// Reduce all per-group outcomes into the final cluster list and summary.
///
/// Runs strictly after every worker has joined, so no synchronization is
/// needed on the counters. Per group with `n` surviving records and `t`
/// surviving bytes, reclaimable space grows by `t - t/n` and the redundant
/// count by `n - 1`.
#[must_use]
pub fn aggregate(
    groups: &mut [SizeGroup],
    stats: &PartitionStats,
) -> (Vec<DuplicateCluster>, ScanSummary) {
    let mut summary = ScanSummary {
        input_files: stats.input_records,
        removed_non_duplicates: stats.singletons_removed,
        singletons_removed: stats.singletons_removed,
        empty_files_removed: stats.empty_files_removed,
        hardlinks_collapsed: stats.hardlinks_removed,
        ..Default::default()
    };

    let mut clusters = Vec::new();
    for group in groups {
        let outcome = &mut group.outcome;
        summary.hardlinks_collapsed += outcome.hardlinks_removed;
        summary.unreadable_skipped += outcome.unreadable_dropped;
        summary.removed_non_duplicates +=
            outcome.evicted_by_fingerprint + outcome.evicted_by_checksum;

        let survivors = group.records.len() as u64;
        if survivors > 0 {
            summary.reclaimable_bytes += group.total_bytes - group.total_bytes / survivors;
            summary.duplicate_files += (survivors - 1) as usize;
        }

        clusters.append(&mut outcome.clusters);
    }

    (clusters, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::FileRecord;
    use std::path::PathBuf;

    fn record(path: &str, size: u64, inode: u64) -> FileRecord {
        FileRecord::new(PathBuf::from(path), size, 1, inode)
    }

    fn confirmed_group(size: u64, paths: &[&str]) -> SizeGroup {
        let records: Vec<FileRecord> = paths
            .iter()
            .enumerate()
            .map(|(i, p)| record(p, size, i as u64))
            .collect();
        let mut group = SizeGroup::new(size, records);
        let mut cluster = DuplicateCluster::new([0u8; 32], size);
        cluster.paths = paths.iter().map(PathBuf::from).collect();
        group.outcome.clusters.push(cluster);
        group
    }

    #[test]
    fn test_cluster_original_and_redundant() {
        let mut cluster = DuplicateCluster::new([1u8; 32], 100);
        cluster.paths = vec![PathBuf::from("/keep"), PathBuf::from("/drop")];

        assert_eq!(cluster.original(), Some(Path::new("/keep")));
        assert_eq!(cluster.redundant(), &[PathBuf::from("/drop")]);
        assert_eq!(cluster.wasted_bytes(), 100);
    }

    #[test]
    fn test_savings_arithmetic() {
        // A cluster of n files of size s reclaims s * (n - 1).
        let mut groups = vec![confirmed_group(100, &["/a", "/b", "/c"])];
        let stats = PartitionStats {
            input_records: 3,
            ..Default::default()
        };

        let (clusters, summary) = aggregate(&mut groups, &stats);

        assert_eq!(clusters.len(), 1);
        assert_eq!(summary.reclaimable_bytes, 200);
        assert_eq!(summary.duplicate_files, 2);
    }

    #[test]
    fn test_aggregate_sums_counters_across_groups() {
        let mut groups = vec![
            confirmed_group(10, &["/a1", "/a2"]),
            confirmed_group(1000, &["/b1", "/b2", "/b3", "/b4"]),
        ];
        groups[0].outcome.evicted_by_fingerprint = 2;
        groups[1].outcome.unreadable_dropped = 1;

        let stats = PartitionStats {
            input_records: 11,
            singletons_removed: 2,
            empty_files_removed: 1,
            hardlinks_removed: 1,
            ..Default::default()
        };

        let (clusters, summary) = aggregate(&mut groups, &stats);

        assert_eq!(clusters.len(), 2);
        assert_eq!(summary.input_files, 11);
        assert_eq!(summary.reclaimable_bytes, 10 + 3000);
        assert_eq!(summary.duplicate_files, 1 + 3);
        assert_eq!(summary.removed_non_duplicates, 2 + 2);
        assert_eq!(summary.unreadable_skipped, 1);
        assert_eq!(summary.hardlinks_collapsed, 1);
        assert_eq!(summary.singletons_removed, 2);
        assert_eq!(summary.empty_files_removed, 1);
    }

    #[test]
    fn test_fully_evicted_group_contributes_nothing() {
        let mut group = SizeGroup::new(10, vec![record("/a", 10, 1), record("/b", 10, 2)]);
        group.retain_records(|_| false);

        let (clusters, summary) = aggregate(&mut [group], &PartitionStats::default());
        assert!(clusters.is_empty());
        assert_eq!(summary.reclaimable_bytes, 0);
        assert_eq!(summary.duplicate_files, 0);
    }
}
