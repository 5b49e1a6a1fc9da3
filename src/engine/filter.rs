//! The two content-hashing filter stages.
//!
//! # Overview
//!
//! Both stages share one protocol built on the record's candidate flag:
//!
//! 1. Compute a digest for every record in the group (dropping records
//!    whose content can no longer be read).
//! 2. Compare records pairwise; a match clears the flag on both sides.
//! 3. Evict every record whose flag survived, i.e. that matched nobody.
//!
//! The fingerprint stage runs the protocol over a cheap head/tail sample
//! digest and exists purely to spare the checksum stage full reads of
//! files that cannot be duplicates. The checksum stage runs it over the
//! whole-file digest and additionally tags the survivors into clusters.
//!
//! The pairwise comparison is O(n²) per group. That is a deliberate,
//! known scaling limit: size partitioning keeps n small in practice, and
//! the simple scan avoids hashing digests into a side table.

use rayon::ThreadPool;

use crate::config::{EngineConfig, FINGERPRINT_DIVISOR, MIN_FINGERPRINT_SAMPLE};
use crate::scanner::{FileRecord, Hasher};
use crate::signal::CancelToken;

use super::group::SizeGroup;
use super::summary::DuplicateCluster;

/// Fingerprint sample size for files of `file_size` bytes: a fixed
/// fraction of the file, bounded below (tiny samples discriminate poorly)
/// and above by `cap` (huge files must not force huge sample reads).
#[must_use]
pub fn fingerprint_sample_size(file_size: u64, cap: u64) -> u64 {
    (file_size / FINGERPRINT_DIVISOR).clamp(MIN_FINGERPRINT_SAMPLE, cap.max(MIN_FINGERPRINT_SAMPLE))
}

/// Run the fingerprint stage over one group.
///
/// Computes the two-part head/tail fingerprint for every member and
/// evicts records whose fingerprint matches no one else's. A record that
/// survives here is exactly one with at least one fingerprint-equal peer;
/// only those records are worth a full checksum.
///
/// Returns `false` when an interrupt cut the stage short; the group must
/// then be considered unfinished.
pub fn fingerprint_filter(
    group: &mut SizeGroup,
    hasher: &Hasher,
    config: &EngineConfig,
    cancel: &CancelToken,
) -> bool {
    if group.len() < 2 {
        return true;
    }

    let sample = fingerprint_sample_size(group.file_size, config.fingerprint_cap);
    for record in &mut group.records {
        if cancel.checkpoint() {
            return false;
        }
        match hasher.fingerprint(&record.path, sample) {
            Ok(fp) => record.fingerprint = Some(fp),
            Err(err) => log::warn!("skipping unreadable file: {err}"),
        }
    }

    group.outcome.unreadable_dropped += group.retain_records(|r| r.fingerprint.is_some());

    mark_unpaired(&mut group.records, |r| r.fingerprint);
    let evicted = group.evict_noncandidates();
    group.outcome.evicted_by_fingerprint += evicted;

    if evicted > 0 {
        log::debug!(
            "fingerprint pass evicted {} of {} record(s) in {} byte group",
            evicted,
            evicted + group.len(),
            group.file_size
        );
    }
    true
}

/// Run the checksum stage over one group and emit its duplicate clusters.
///
/// Streams every surviving file through the full-content digest, splitting
/// the group's records across workers when the group is big enough for the
/// thread overhead to pay off. Survivors of the pairwise confirmation are
/// tagged into equivalence classes; each class becomes one
/// [`DuplicateCluster`] in the group outcome, its first member (locality
/// order) designated the original.
///
/// Returns `false` when an interrupt cut the stage short.
pub fn confirm_checksums(
    group: &mut SizeGroup,
    hasher: &Hasher,
    config: &EngineConfig,
    pool: Option<&ThreadPool>,
    cancel: &CancelToken,
) -> bool {
    if group.len() < 2 {
        return true;
    }

    let chunked = pool.filter(|_| config.workers > 1 && group.total_bytes > config.chunk_threshold);
    match chunked {
        Some(pool) => {
            let chunk_len = checksum_chunk_len(group, config);
            pool.scope(|scope| {
                for chunk in group.records.chunks_mut(chunk_len) {
                    scope.spawn(move |_| checksum_records(chunk, hasher, cancel));
                }
            });
        }
        None => checksum_records(&mut group.records, hasher, cancel),
    }

    if cancel.is_cancelled() {
        return false;
    }

    group.outcome.unreadable_dropped += group.retain_records(|r| r.checksum.is_some());

    mark_unpaired(&mut group.records, |r| r.checksum);
    group.outcome.evicted_by_checksum += group.evict_noncandidates();

    build_clusters(group);
    true
}

/// Records per checksum worker: enough chunks that each carries roughly
/// one threshold's worth of bytes, but never more chunks than workers or
/// than records.
fn checksum_chunk_len(group: &SizeGroup, config: &EngineConfig) -> usize {
    let wanted = (group.total_bytes / config.chunk_threshold.max(1)).max(2) as usize;
    let chunks = wanted.min(config.workers).min(group.len()).max(1);
    group.len().div_ceil(chunks)
}

/// Stream the full checksum for each record in a chunk.
///
/// Chunks are disjoint slices of one group's records, so workers never
/// touch the same record. Read failures leave the checksum unset; the
/// caller drops those records afterwards.
fn checksum_records(records: &mut [FileRecord], hasher: &Hasher, cancel: &CancelToken) {
    for record in records {
        if cancel.checkpoint() {
            return;
        }
        match hasher.checksum(&record.path) {
            Ok(digest) => record.checksum = Some(digest),
            Err(err) => log::warn!("skipping unreadable file: {err}"),
        }
    }
}

/// Pairwise comparison pass shared by both stages.
///
/// Sets every candidate flag, then clears the flags of any two records
/// whose keys compare equal. Records with a `None` key never match.
fn mark_unpaired<K, F>(records: &mut [FileRecord], key: F)
where
    K: PartialEq + Copy,
    F: Fn(&FileRecord) -> Option<K>,
{
    for record in records.iter_mut() {
        record.candidate = true;
    }
    for i in 0..records.len() {
        let Some(key_i) = key(&records[i]) else {
            continue;
        };
        for j in (i + 1)..records.len() {
            if key(&records[j]) == Some(key_i) {
                records[i].candidate = false;
                records[j].candidate = false;
            }
        }
    }
}

/// Tag the group's surviving records into checksum-equal equivalence
/// classes and store them as duplicate clusters.
///
/// Tags are assigned in first-occurrence order, so a cluster's members
/// keep the group's locality order and the first member is the original.
fn build_clusters(group: &mut SizeGroup) {
    let n = group.records.len();
    let mut next_tag = 0;

    for i in 0..n {
        if group.records[i].cluster.is_some() {
            continue;
        }
        group.records[i].cluster = Some(next_tag);
        let digest = group.records[i].checksum;
        for j in (i + 1)..n {
            if group.records[j].cluster.is_none() && group.records[j].checksum == digest {
                group.records[j].cluster = Some(next_tag);
            }
        }
        next_tag += 1;
    }

    let mut clusters: Vec<DuplicateCluster> = Vec::with_capacity(next_tag);
    for record in &group.records {
        let (Some(tag), Some(digest)) = (record.cluster, record.checksum) else {
            continue;
        };
        if tag == clusters.len() {
            clusters.push(DuplicateCluster::new(digest, group.file_size));
        }
        clusters[tag].paths.push(record.path.clone());
    }

    debug_assert!(clusters.iter().all(|c| c.paths.len() >= 2));
    group.outcome.clusters = clusters;
}
