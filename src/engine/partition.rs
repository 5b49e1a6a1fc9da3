//! Size partitioning: the first and cheapest filter.
//!
//! Files of different sizes cannot be duplicates, so one sort plus one
//! linear scan splits the whole working set into exact-size groups without
//! any pairwise comparison. Singleton runs are retired on the spot, and
//! zero-byte files get their own short path: all empty files are trivially
//! identical, so they only pass through hard-link collapsing before being
//! counted and logged.

use crate::scanner::{FileKind, FileRecord};

use super::group::SizeGroup;

/// Counters produced while splitting the record set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionStats {
    /// Records that entered the partitioner
    pub input_records: usize,
    /// Records retired because no other file shared their size
    pub singletons_removed: usize,
    /// Zero-byte records retired (after hard-link collapsing)
    pub empty_files_removed: usize,
    /// Hard links collapsed within the empty-file group
    pub hardlinks_removed: usize,
    /// Groups handed on to the filter pipeline
    pub groups_formed: usize,
}

/// The partitioner's output: filterable groups plus everything retired
/// along the way.
#[derive(Debug, Default)]
pub struct Partition {
    /// Equal-size groups with at least two members, each sorted by locality
    pub groups: Vec<SizeGroup>,
    /// Zero-byte records, post-collapse, surfaced for reporting
    pub empty_records: Vec<FileRecord>,
    /// Removal counters
    pub stats: PartitionStats,
}

/// Split records into exact-size equivalence classes.
///
/// Sorts by size once at entry, then scans linearly: each run of equal
/// sizes becomes one group. Runs of length one are dropped immediately;
/// the zero-size run is routed past the hashing stages entirely.
///
/// Every input record ends up in exactly one place: a group, the empty
/// list, or a removal counter.
///
/// # Arguments
///
/// * `records` - The discovered working set, in any order
/// * `collapse_physical` - Run hard-link collapsing on the empty group
///   (groups with content are collapsed later, inside the per-group
///   pipeline)
#[must_use]
pub fn partition_by_size(mut records: Vec<FileRecord>, collapse_physical: bool) -> Partition {
    let mut partition = Partition {
        stats: PartitionStats {
            input_records: records.len(),
            ..Default::default()
        },
        ..Default::default()
    };

    records.sort_by_key(|r| r.size);

    let mut run: Vec<FileRecord> = Vec::new();
    for record in records {
        if run.last().is_some_and(|prev| prev.size != record.size) {
            close_run(std::mem::take(&mut run), collapse_physical, &mut partition);
        }
        run.push(record);
    }
    close_run(run, collapse_physical, &mut partition);

    log::info!(
        "{} record(s) split into {} group(s); {} singleton(s) and {} empty file(s) retired",
        partition.stats.input_records,
        partition.stats.groups_formed,
        partition.stats.singletons_removed,
        partition.stats.empty_files_removed,
    );

    partition
}

/// Close one run of equal-size records.
fn close_run(run: Vec<FileRecord>, collapse_physical: bool, partition: &mut Partition) {
    if run.is_empty() {
        return;
    }
    if run.len() == 1 {
        partition.stats.singletons_removed += 1;
        log::trace!(
            "retired unique size {}: {}",
            run[0].size,
            run[0].path.display()
        );
        return;
    }

    let size = run[0].size;
    let mut group = SizeGroup::new(size, run);
    group.sort_by_locality();

    if size == 0 {
        if collapse_physical {
            partition.stats.hardlinks_removed += group.collapse_hardlinks();
        }
        partition.stats.empty_files_removed += group.len();
        for record in &group.records {
            if record.kind == FileKind::SymlinkLoop {
                log::debug!("ignoring symlink cycle placeholder {}", record.path.display());
            } else {
                log::debug!("ignoring empty file {}", record.path.display());
            }
        }
        partition.empty_records = group.records;
    } else {
        partition.stats.groups_formed += 1;
        partition.groups.push(group);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn record(path: &str, size: u64, dev: u64, inode: u64) -> FileRecord {
        FileRecord::new(PathBuf::from(path), size, dev, inode)
    }

    #[test]
    fn test_partition_empty_input() {
        let partition = partition_by_size(Vec::new(), false);
        assert!(partition.groups.is_empty());
        assert_eq!(partition.stats, PartitionStats::default());
    }

    #[test]
    fn test_partition_groups_by_exact_size() {
        let records = vec![
            record("/a", 100, 1, 1),
            record("/b", 200, 1, 2),
            record("/c", 100, 1, 3),
            record("/d", 200, 1, 4),
            record("/e", 300, 1, 5),
        ];
        let partition = partition_by_size(records, false);

        assert_eq!(partition.groups.len(), 2);
        assert_eq!(partition.stats.groups_formed, 2);
        assert_eq!(partition.stats.singletons_removed, 1);
        for group in &partition.groups {
            assert!(group.records.iter().all(|r| r.size == group.file_size));
        }
    }

    #[test]
    fn test_partition_accounts_for_every_record() {
        let records = vec![
            record("/a", 10, 1, 1),
            record("/b", 10, 1, 2),
            record("/c", 0, 1, 3),
            record("/d", 0, 1, 4),
            record("/e", 99, 1, 5),
        ];
        let total = records.len();
        let partition = partition_by_size(records, false);

        let grouped: usize = partition.groups.iter().map(SizeGroup::len).sum();
        assert_eq!(
            grouped + partition.stats.singletons_removed + partition.stats.empty_files_removed,
            total
        );
    }

    #[test]
    fn test_partition_orders_groups_members_by_locality() {
        let records = vec![
            record("/far", 64, 2, 50),
            record("/near", 64, 1, 10),
            record("/mid", 64, 1, 90),
        ];
        let partition = partition_by_size(records, false);

        let keys: Vec<_> = partition.groups[0]
            .records
            .iter()
            .map(FileRecord::locality_key)
            .collect();
        assert_eq!(keys, vec![(1, 10), (1, 90), (2, 50)]);
    }

    #[test]
    fn test_empty_files_skip_grouping_but_collapse_hardlinks() {
        let records = vec![
            record("/e1", 0, 1, 7),
            record("/e2", 0, 1, 7), // hard link to /e1
            record("/e3", 0, 1, 8),
        ];
        let partition = partition_by_size(records, true);

        assert!(partition.groups.is_empty());
        assert_eq!(partition.stats.hardlinks_removed, 1);
        assert_eq!(partition.stats.empty_files_removed, 2);
        assert_eq!(partition.empty_records.len(), 2);
    }

    #[test]
    fn test_single_empty_file_is_a_singleton() {
        let records = vec![record("/only-empty", 0, 1, 1), record("/x", 5, 1, 2)];
        let partition = partition_by_size(records, false);

        assert_eq!(partition.stats.singletons_removed, 2);
        assert_eq!(partition.stats.empty_files_removed, 0);
    }
}
