//! Outcome of one execution attempt.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Exit code synthesized for a unit whose task panicked (matches Rust's panic exit code).
pub const PANIC_EXIT_CODE: i32 = 101;

/// Why an attempt failed. Every variant is retryable under the same policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// The unit did not report before the per-job timer fired.
    #[error("timed out")]
    Timeout,
    /// The unit reported a failure message.
    #[error("{0}")]
    ExecutionError(String),
    /// The unit terminated without reporting.
    #[error("worker exited abnormally with code {0}")]
    AbnormalExit(i32),
}

/// Source image facts reported by a successful unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub original_width: u32,
    pub original_height: u32,
    /// Number of transformations written.
    pub tasks_completed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSuccess {
    pub name: String,
    pub elapsed_ms: u64,
    pub metadata: ImageMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobFailure {
    pub name: String,
    pub reason: FailureReason,
    pub elapsed_ms: u64,
}

/// Tagged result of one execution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(JobSuccess),
    Failure(JobFailure),
}

impl Outcome {
    pub fn failure(name: &str, reason: FailureReason, elapsed: Duration) -> Self {
        Outcome::Failure(JobFailure {
            name: name.to_string(),
            reason,
            elapsed_ms: millis(elapsed),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Outcome::Success(s) => &s.name,
            Outcome::Failure(f) => &f.name,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        match self {
            Outcome::Success(s) => s.elapsed_ms,
            Outcome::Failure(f) => f.elapsed_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

pub(crate) fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
