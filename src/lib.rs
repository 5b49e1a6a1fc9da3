//! dupelint - Duplicate File Finder
//!
//! Finds exact duplicate files within filesystem subtrees by narrowing
//! same-size files through a cheap head/tail fingerprint to full BLAKE3
//! checksums, parallelized over a bounded worker pool.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod report;
pub mod scanner;
pub mod signal;

use cli::{Cli, DumpMode};
use engine::{Engine, EngineError};
use error::ExitCode;
use scanner::Walker;

/// Run the application end to end: walk, filter, confirm, report.
///
/// # Errors
///
/// Returns an error only for startup resource failures (e.g. the signal
/// handler cannot be installed) or when the result log cannot be written.
/// Per-file problems degrade to warnings and a partial-success exit code.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    let cancel = signal::install_handler()?;

    let walker_config = cli.walker_config();
    let engine_config = cli.engine_config(&walker_config);

    let walker = Walker::new(walker_config).with_cancel_token(cancel.clone());
    let outcome = walker.walk();
    if outcome.interrupted {
        return Ok(ExitCode::Interrupted);
    }
    log::info!("discovered {} file(s)", outcome.records.len());

    if cli.dump == Some(DumpMode::Basenames) {
        report::dump_double_basenames(&outcome.records);
        return Ok(ExitCode::Success);
    }

    let engine = Engine::new(engine_config, cancel.clone());

    if cli.dump == Some(DumpMode::Groups) {
        let partition = engine.partition(outcome.records);
        report::dump_size_groups(&partition.groups);
        return Ok(ExitCode::Success);
    }

    let scan = match engine.run(outcome.records) {
        Ok(scan) => scan,
        Err(EngineError::Interrupted) => {
            log::warn!("scan interrupted, partial results discarded");
            return Ok(ExitCode::Interrupted);
        }
    };

    // Results are final; a late interrupt now terminates instead of
    // unwinding.
    cancel.mark_committed();

    let mut summary = scan.summary;
    summary.traversal_errors = outcome.errors.len();

    report::print_clusters(&scan.clusters);
    report::print_summary(&summary);

    if let Some(path) = &cli.output {
        report::write_json_log(path, &scan.clusters, &summary)?;
        log::info!("result log written to {}", path.display());
    }

    Ok(
        if summary.traversal_errors > 0 || summary.unreadable_skipped > 0 {
            ExitCode::PartialSuccess
        } else if scan.clusters.is_empty() {
            ExitCode::NoDuplicates
        } else {
            ExitCode::Success
        },
    )
}
