//! Batch result aggregation and summary statistics.

use serde::Serialize;
use std::time::Duration;

use crate::outcome::{millis, JobFailure, JobSuccess, Outcome};

/// Derived batch statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub success_count: usize,
    pub failure_count: usize,
    /// Wall-clock time of the whole batch.
    pub total_elapsed_ms: u64,
    /// Wall-clock time divided by the number of jobs (0 for an empty batch).
    pub average_per_job_ms: f64,
    /// Mean reported processing time of successful jobs; `None` if none succeeded.
    pub average_successful_processing_ms: Option<f64>,
}

/// Accumulates terminal outcomes in the order the scheduler observes them.
///
/// Fed exactly once per job; retried attempts never show up here.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    results: Vec<JobSuccess>,
    errors: Vec<JobFailure>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Success(s) => self.results.push(s),
            Outcome::Failure(f) => self.errors.push(f),
        }
    }

    pub fn results(&self) -> &[JobSuccess] {
        &self.results
    }

    pub fn errors(&self) -> &[JobFailure] {
        &self.errors
    }

    /// Number of terminal outcomes recorded so far.
    pub fn recorded(&self) -> usize {
        self.results.len() + self.errors.len()
    }

    pub fn summary(&self, total_elapsed: Duration) -> BatchSummary {
        let total_elapsed_ms = millis(total_elapsed);
        let jobs = self.recorded();
        let average_per_job_ms = if jobs == 0 {
            0.0
        } else {
            total_elapsed_ms as f64 / jobs as f64
        };
        let average_successful_processing_ms = if self.results.is_empty() {
            None
        } else {
            let sum: u64 = self.results.iter().map(|r| r.elapsed_ms).sum();
            Some(sum as f64 / self.results.len() as f64)
        };
        BatchSummary {
            success_count: self.results.len(),
            failure_count: self.errors.len(),
            total_elapsed_ms,
            average_per_job_ms,
            average_successful_processing_ms,
        }
    }

    pub fn into_report(self, elapsed: Duration) -> BatchReport {
        BatchReport {
            results: self.results,
            errors: self.errors,
            elapsed,
        }
    }
}

/// Final product of one batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub results: Vec<JobSuccess>,
    pub errors: Vec<JobFailure>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn summary(&self) -> BatchSummary {
        let agg = ResultAggregator {
            results: self.results.clone(),
            errors: self.errors.clone(),
        };
        agg.summary(self.elapsed)
    }
}
