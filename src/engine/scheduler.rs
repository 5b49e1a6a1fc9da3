//! Per-group work distribution over a bounded worker pool.
//!
//! # Overview
//!
//! Groups are first reordered by the (device, inode) of their first
//! record, extending the locality ordering the partitioner established
//! *within* groups to the sequence of groups themselves: a spinning disk
//! then serves the hashing stages roughly front-to-back.
//!
//! Each group then runs the pipeline `hard-link collapse → fingerprint
//! filter → checksum confirm`, in that order and to completion, before
//! its results are visible to aggregation:
//!
//! - With one worker (or no pool) every group runs inline on the calling
//!   thread.
//! - Groups at or below the dispatch threshold always run inline; thread
//!   handoff would cost more than the hashing they need.
//! - Larger groups are dispatched in batches of at most `workers`, each
//!   batch joined before the next is issued. At no point are more than
//!   `workers` groups in flight.
//!
//! An eager variant dispatches every eligible group immediately instead
//! of joining between batches. It keeps the pool's thread bound but lets
//! the whole backlog queue up at once, raising peak memory use; it is
//! experimental and only reachable through an explicit opt-in flag.
//!
//! Workers only ever touch disjoint groups, so no locking is needed;
//! per-group counters are reduced into the run summary after everything
//! has joined.

use rayon::ThreadPool;

use crate::config::EngineConfig;
use crate::scanner::Hasher;
use crate::signal::CancelToken;

use super::filter::{confirm_checksums, fingerprint_filter};
use super::group::SizeGroup;

/// Run the filter pipeline over every group, in locality order.
pub fn run_groups(
    groups: &mut [SizeGroup],
    config: &EngineConfig,
    hasher: &Hasher,
    pool: Option<&ThreadPool>,
    cancel: &CancelToken,
) {
    groups.sort_by_key(SizeGroup::first_locality_key);
    log::info!("processing {} group(s)", groups.len());

    match pool {
        None => run_serial(groups, config, hasher, cancel),
        Some(pool) if config.eager_scheduler => run_eager(groups, config, hasher, pool, cancel),
        Some(pool) => run_strict(groups, config, hasher, pool, cancel),
    }
}

/// One worker, or no pool available: everything inline.
fn run_serial(
    groups: &mut [SizeGroup],
    config: &EngineConfig,
    hasher: &Hasher,
    cancel: &CancelToken,
) {
    for group in groups.iter_mut() {
        if cancel.checkpoint() {
            return;
        }
        process_group(group, config, hasher, None, cancel);
    }
}

/// Default discipline: batches of at most `workers` dispatched groups,
/// each batch joined before more work is issued.
fn run_strict(
    groups: &mut [SizeGroup],
    config: &EngineConfig,
    hasher: &Hasher,
    pool: &ThreadPool,
    cancel: &CancelToken,
) {
    let mut batch: Vec<&mut SizeGroup> = Vec::with_capacity(config.workers);

    for group in groups.iter_mut() {
        if cancel.checkpoint() {
            break;
        }
        if group.total_bytes <= config.dispatch_threshold {
            process_group(group, config, hasher, Some(pool), cancel);
        } else {
            batch.push(group);
            if batch.len() == config.workers {
                dispatch_batch(&mut batch, config, hasher, pool, cancel);
            }
        }
    }

    dispatch_batch(&mut batch, config, hasher, pool, cancel);
}

/// Experimental discipline: every eligible group submitted at once, one
/// join at the end. Same thread bound, much larger in-flight backlog.
fn run_eager(
    groups: &mut [SizeGroup],
    config: &EngineConfig,
    hasher: &Hasher,
    pool: &ThreadPool,
    cancel: &CancelToken,
) {
    log::warn!("eager scheduler enabled: unstable, peak resource use may spike");

    pool.scope(|scope| {
        for group in groups.iter_mut() {
            if cancel.checkpoint() {
                break;
            }
            if group.total_bytes > config.dispatch_threshold {
                scope.spawn(move |_| process_group(group, config, hasher, Some(pool), cancel));
            } else {
                process_group(group, config, hasher, Some(pool), cancel);
            }
        }
    });
}

/// Hand one batch to the pool and wait for all of it to finish.
fn dispatch_batch(
    batch: &mut Vec<&mut SizeGroup>,
    config: &EngineConfig,
    hasher: &Hasher,
    pool: &ThreadPool,
    cancel: &CancelToken,
) {
    if batch.is_empty() {
        return;
    }
    log::debug!("dispatching batch of {} group(s)", batch.len());
    pool.scope(|scope| {
        for group in batch.drain(..) {
            scope.spawn(move |_| process_group(group, config, hasher, Some(pool), cancel));
        }
    });
}

/// The full per-group pipeline. Stages run in a fixed order; each stage
/// sees only what the previous one left in the group.
fn process_group(
    group: &mut SizeGroup,
    config: &EngineConfig,
    hasher: &Hasher,
    pool: Option<&ThreadPool>,
    cancel: &CancelToken,
) {
    if cancel.is_cancelled() {
        return;
    }

    if config.collapse_physical {
        group.collapse_hardlinks();
    }

    if !fingerprint_filter(group, hasher, config, cancel) {
        return;
    }
    confirm_checksums(group, hasher, config, pool, cancel);
}
