//! Size groups: the mutable working set each filter stage narrows down.
//!
//! A group owns its records in a plain vector ordered by physical locality.
//! Every removal is a compaction (`retain`-style), so indices never dangle
//! and the head/tail of a group need no special casing when an endpoint is
//! evicted.

use crate::scanner::FileRecord;

use super::summary::DuplicateCluster;

/// Per-group results, filled in as the filter stages run and reduced into
/// the run summary after all workers have joined.
#[derive(Debug, Default)]
pub struct GroupOutcome {
    /// Records dropped because another path reached the same inode
    pub hardlinks_removed: usize,
    /// Records evicted for having no fingerprint-equal peer
    pub evicted_by_fingerprint: usize,
    /// Records evicted for having no checksum-equal peer
    pub evicted_by_checksum: usize,
    /// Records dropped because their content could not be read
    pub unreadable_dropped: usize,
    /// Confirmed duplicate clusters
    pub clusters: Vec<DuplicateCluster>,
}

/// All records sharing one exact byte size.
///
/// Records are kept sorted by (device, inode) from partitioning onward:
/// the hard-link collapser depends on that adjacency and the hashing
/// stages profit from the disk locality.
#[derive(Debug, Default)]
pub struct SizeGroup {
    /// Byte size shared by every member record
    pub file_size: u64,
    /// Member records in locality order
    pub records: Vec<FileRecord>,
    /// Sum of member sizes, kept in step with evictions
    pub total_bytes: u64,
    /// Results of the filter pipeline over this group
    pub outcome: GroupOutcome,
}

impl SizeGroup {
    /// Create a group from a run of equal-size records.
    #[must_use]
    pub fn new(file_size: u64, records: Vec<FileRecord>) -> Self {
        debug_assert!(records.iter().all(|r| r.size == file_size));
        let total_bytes = file_size * records.len() as u64;
        Self {
            file_size,
            records,
            total_bytes,
            outcome: GroupOutcome::default(),
        }
    }

    /// Number of records still in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if every record has been evicted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sort members by (device, inode).
    pub fn sort_by_locality(&mut self) {
        self.records.sort_by_key(FileRecord::locality_key);
    }

    /// Locality key of the first member, used to order whole groups.
    #[must_use]
    pub fn first_locality_key(&self) -> (u64, u64) {
        self.records
            .first()
            .map_or((0, 0), FileRecord::locality_key)
    }

    /// Drop records that are just another path to the physically identical
    /// file: adjacent members sharing device and inode collapse to one.
    ///
    /// Correct only because [`sort_by_locality`](Self::sort_by_locality)
    /// made identical inodes contiguous. Running it again is a no-op.
    ///
    /// Returns the number of records removed.
    pub fn collapse_hardlinks(&mut self) -> usize {
        let before = self.records.len();
        self.records.dedup_by(|later, earlier| later.same_inode(earlier));
        let removed = before - self.records.len();

        self.total_bytes -= self.file_size * removed as u64;
        self.outcome.hardlinks_removed += removed;
        if removed > 0 {
            log::debug!(
                "collapsed {} hard link(s) in {} byte group",
                removed,
                self.file_size
            );
        }
        removed
    }

    /// Keep only records matching the predicate, updating the byte total.
    ///
    /// Compaction preserves locality order. Returns the number removed.
    pub fn retain_records(&mut self, keep: impl FnMut(&FileRecord) -> bool) -> usize {
        let before = self.records.len();
        self.records.retain(keep);
        let removed = before - self.records.len();
        self.total_bytes -= self.file_size * removed as u64;
        removed
    }

    /// Evict every record whose candidate flag is still set, i.e. that no
    /// pairwise comparison matched to a peer.
    pub fn evict_noncandidates(&mut self) -> usize {
        self.retain_records(|r| !r.candidate)
    }
}
