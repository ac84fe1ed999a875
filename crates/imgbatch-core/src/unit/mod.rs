//! Execution units: isolated contexts that run exactly one job attempt.
//!
//! The scheduler never shares mutable state with a unit. It launches the unit
//! through an [`Executor`], runs it as its own task, and waits for one of:
//! a report message, an exit without a report, or the per-job timer. The wait
//! is a single `tokio::time::timeout`, so a report arriving after the timer
//! fired is dropped together with the aborted unit and never recorded.

mod process;
pub mod worker;

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use crate::job::JobDescriptor;
use crate::outcome::{
    millis, FailureReason, ImageMetadata, JobFailure, JobSuccess, Outcome, PANIC_EXIT_CODE,
};

pub use process::ProcessExecutor;
pub use worker::WorkerRequest;

/// Message a unit sends back on completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnitReport {
    Success {
        name: String,
        elapsed_ms: u64,
        metadata: ImageMetadata,
    },
    Failure {
        name: String,
        message: String,
        elapsed_ms: u64,
    },
}

/// How a unit ended, as seen from outside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitExit {
    /// The unit sent its report.
    Reported(UnitReport),
    /// The unit terminated without a report.
    Exited(i32),
}

/// A launched unit. Dropping it must tear the unit down.
pub type UnitFuture = Pin<Box<dyn Future<Output = UnitExit> + Send + 'static>>;

/// Launches execution units. The production executor spawns worker processes;
/// tests plug in scripted executors.
pub trait Executor: Send + Sync + 'static {
    /// Start one unit bound to `job`. The future resolves exactly once.
    fn launch(&self, job: &JobDescriptor) -> UnitFuture;
}

impl UnitExit {
    fn into_outcome(self, job: &JobDescriptor, elapsed: Duration) -> Outcome {
        match self {
            UnitExit::Reported(UnitReport::Success {
                elapsed_ms,
                metadata,
                ..
            }) => Outcome::Success(JobSuccess {
                name: job.name.clone(),
                elapsed_ms,
                metadata,
            }),
            UnitExit::Reported(UnitReport::Failure {
                message,
                elapsed_ms,
                ..
            }) => Outcome::Failure(JobFailure {
                name: job.name.clone(),
                reason: FailureReason::ExecutionError(message),
                elapsed_ms,
            }),
            UnitExit::Exited(code) => {
                Outcome::failure(&job.name, FailureReason::AbnormalExit(code), elapsed)
            }
        }
    }
}

/// Run one attempt of `job` in a fresh unit and turn whatever happens into an [`Outcome`].
///
/// The unit is spawned as its own task; a panic inside it surfaces as
/// `AbnormalExit(101)` and cannot reach the caller.
pub async fn supervise<E>(executor: &E, job: &JobDescriptor, timeout: Duration) -> Outcome
where
    E: Executor + ?Sized,
{
    let started = Instant::now();
    let mut unit = tokio::spawn(executor.launch(job));

    match tokio::time::timeout(timeout, &mut unit).await {
        Ok(Ok(exit)) => exit.into_outcome(job, started.elapsed()),
        Ok(Err(join_err)) => {
            let code = if join_err.is_panic() { PANIC_EXIT_CODE } else { -1 };
            tracing::warn!(job = %job.name, attempt = job.attempt, "unit task ended abnormally: {}", join_err);
            Outcome::failure(&job.name, FailureReason::AbnormalExit(code), started.elapsed())
        }
        Err(_) => {
            unit.abort();
            tracing::warn!(
                job = %job.name,
                attempt = job.attempt,
                timeout_ms = millis(timeout),
                "unit timed out; terminated"
            );
            Outcome::failure(&job.name, FailureReason::Timeout, started.elapsed())
        }
    }
}
