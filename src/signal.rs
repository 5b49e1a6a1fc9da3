//! Cooperative cancellation for interactive interrupts.
//!
//! The Ctrl+C handler installed here does exactly one thing: it counts.
//! Every decision about *what an interrupt means* happens on the normal
//! control path, at the checkpoints the pipeline already passes through
//! (per traversal entry, per group dispatch, per record hashed):
//!
//! - First interrupt: cooperative unwind. Checkpoints start reporting
//!   cancellation and the run winds down, reporting what it confirmed.
//! - Second interrupt, or any interrupt after results have been committed:
//!   the next checkpoint terminates the process immediately.
//!
//! # Example
//!
//! ```rust,no_run
//! use dupelint::signal::install_handler;
//!
//! let cancel = install_handler().expect("failed to install signal handler");
//!
//! for work_item in 0..1000 {
//!     if cancel.checkpoint() {
//!         eprintln!("interrupted, stopping early");
//!         break;
//!     }
//!     // ... process work_item ...
//! }
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::ExitCode;

/// Shared cancellation state for one run.
///
/// Cloning is cheap; all clones observe the same interrupt counter.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    /// Number of interrupts received so far
    interrupts: Arc<AtomicUsize>,
    /// Set once results are being written; a single interrupt past this
    /// point terminates instead of unwinding
    committed: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token with no interrupts recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one interrupt. Called from the signal handler; must stay
    /// async-signal-trivial (no allocation, no locking, no exit).
    pub fn note_interrupt(&self) {
        self.interrupts.fetch_add(1, Ordering::SeqCst);
    }

    /// Mark the point of no return: duplicate lists are finalized and
    /// being flushed.
    pub fn mark_committed(&self) {
        self.committed.store(true, Ordering::SeqCst);
    }

    /// Whether a cooperative unwind has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.interrupts.load(Ordering::SeqCst) > 0
    }

    /// Cancellation checkpoint.
    ///
    /// Returns `true` when the caller should unwind promptly. Terminates
    /// the whole process when the user insisted (a second interrupt) or
    /// when an interrupt arrived after [`mark_committed`](Self::mark_committed).
    pub fn checkpoint(&self) -> bool {
        let count = self.interrupts.load(Ordering::SeqCst);
        if count == 0 {
            return false;
        }
        if count > 1 || self.committed.load(Ordering::SeqCst) {
            log::warn!("interrupt received again, terminating immediately");
            std::process::exit(ExitCode::Interrupted.as_i32());
        }
        true
    }
}

/// Install the Ctrl+C handler and return the token it feeds.
///
/// # Errors
///
/// Fails if a handler is already installed for this process; that is a
/// startup resource failure and treated as fatal by the caller.
pub fn install_handler() -> anyhow::Result<CancelToken> {
    let token = CancelToken::new();
    let handler_token = token.clone();

    ctrlc::set_handler(move || {
        handler_token.note_interrupt();
        eprintln!("\nInterrupt received, finishing up. Press Ctrl+C again to abort.");
    })?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_token_is_not_cancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(!token.checkpoint());
    }

    #[test]
    fn test_single_interrupt_requests_unwind() {
        let token = CancelToken::new();
        token.note_interrupt();

        assert!(token.is_cancelled());
        assert!(token.checkpoint());
        // A repeated checkpoint after one interrupt still unwinds
        // cooperatively rather than terminating.
        assert!(token.checkpoint());
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.note_interrupt();

        assert!(token.is_cancelled());
    }
}
