//! Result reporting: console output, diagnostic dumps and the JSON log.
//!
//! Everything a user reads lands here. Results go to stdout; diagnostics
//! and warnings go through the logger to stderr, so scripted consumers
//! can rely on stdout carrying only results.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use bytesize::ByteSize;
use serde::Serialize;

use crate::engine::{DuplicateCluster, ScanSummary, SizeGroup};
use crate::scanner::FileRecord;

/// Print every confirmed cluster, original first.
pub fn print_clusters(clusters: &[DuplicateCluster]) {
    for (index, cluster) in clusters.iter().enumerate() {
        println!(
            "# set {} - {} files of {} each (checksum {})",
            index + 1,
            cluster.paths.len(),
            ByteSize(cluster.file_size),
            &cluster.checksum_hex()[..16],
        );
        if let Some(original) = cluster.original() {
            println!("  keep    {}", original.display());
        }
        for path in cluster.redundant() {
            println!("  remove  {}", path.display());
        }
    }
}

/// Print the run totals.
pub fn print_summary(summary: &ScanSummary) {
    println!();
    println!(
        "{} of {} scanned file(s) are redundant copies",
        summary.duplicate_files, summary.input_files
    );
    println!(
        "{} [{} bytes] could be reclaimed",
        summary.reclaimable_display(),
        summary.reclaimable_bytes
    );

    log::info!(
        "retired along the way: {} unique-size file(s), {} empty file(s), {} hard link path(s)",
        summary.singletons_removed,
        summary.empty_files_removed,
        summary.hardlinks_collapsed,
    );
    if summary.unreadable_skipped > 0 || summary.traversal_errors > 0 {
        log::warn!(
            "{} file(s) skipped due to read errors, {} traversal error(s)",
            summary.unreadable_skipped,
            summary.traversal_errors,
        );
    }
}

/// Diagnostic dump: every set of records sharing a basename.
pub fn dump_double_basenames(records: &[FileRecord]) {
    let mut by_name: BTreeMap<&OsStr, Vec<&FileRecord>> = BTreeMap::new();
    for record in records {
        if let Some(name) = record.path.file_name() {
            by_name.entry(name).or_default().push(record);
        }
    }

    let mut set_number = 1;
    for members in by_name.values().filter(|m| m.len() > 1) {
        for record in members {
            println!("{} {} {}", set_number, record.path.display(), record.size);
        }
        set_number += 1;
    }
}

/// Diagnostic dump: the equal-size groups as partitioned, one
/// `size path` line per record.
pub fn dump_size_groups(groups: &[SizeGroup]) {
    for group in groups {
        for record in &group.records {
            println!("{} {}", record.size, record.path.display());
        }
    }
}

/// One run's results as written to the JSON log file.
#[derive(Serialize)]
struct RunLog<'a> {
    clusters: &'a [DuplicateCluster],
    summary: &'a ScanSummary,
}

/// Serialize clusters and summary to `path` as pretty-printed JSON.
///
/// # Errors
///
/// Fails if the file cannot be created or written.
pub fn write_json_log(
    path: &Path,
    clusters: &[DuplicateCluster],
    summary: &ScanSummary,
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &RunLog { clusters, summary })?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
