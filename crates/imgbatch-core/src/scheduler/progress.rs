//! Progress notifications for the CLI.
//!
//! Purely observational: the scheduler sends them on an unbounded channel and
//! never waits on the receiver. A dropped receiver is ignored.

use std::time::Duration;

/// One scheduler observation a consumer may want to render.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A job reached its terminal outcome. `index` counts terminal outcomes (1-based).
    Completed {
        index: usize,
        total: usize,
        name: String,
        success: bool,
        elapsed_ms: u64,
        /// Failure reason text, for failed jobs.
        error: Option<String>,
    },
    /// A failed attempt will be retried after `delay`.
    Retrying {
        name: String,
        /// The attempt about to run.
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
    },
}
