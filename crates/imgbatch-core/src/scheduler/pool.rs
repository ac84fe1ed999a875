//! The scheduler loop.
//!
//! Every unit runs in its own task and reports back with exactly one
//! [`PoolEvent::Finished`]. Retry delays run as timer tasks that send
//! [`PoolEvent::RetryReady`]. Only the loop in [`PoolScheduler::run`] touches
//! [`PoolState`] and the aggregator, so admission needs no locking.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc::{self, UnboundedSender};

use crate::config::{ConfigError, PoolConfig};
use crate::job::JobDescriptor;
use crate::outcome::Outcome;
use crate::report::{BatchReport, ResultAggregator};
use crate::retry::RetryDecision;
use crate::unit::{supervise, Executor};

use super::progress::ProgressEvent;
use super::state::PoolState;

enum PoolEvent {
    /// A unit attempt ended (report, exit, or timeout).
    Finished { job: JobDescriptor, outcome: Outcome },
    /// The retry delay of a job elapsed; its slot is still held.
    RetryReady(JobDescriptor),
}

/// Bounded-concurrency batch runner.
pub struct PoolScheduler {
    config: PoolConfig,
    executor: Arc<dyn Executor>,
    progress: Option<UnboundedSender<ProgressEvent>>,
}

impl PoolScheduler {
    /// Fails on invalid tunables, before anything is admitted.
    pub fn new(config: PoolConfig, executor: Arc<dyn Executor>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            executor,
            progress: None,
        })
    }

    pub fn with_progress(mut self, progress: UnboundedSender<ProgressEvent>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Run every job to a terminal outcome. Resolves once the backlog is empty
    /// and no unit is active; per-job failures end up in `BatchReport::errors`.
    pub async fn run(&self, jobs: Vec<JobDescriptor>) -> BatchReport {
        let started = Instant::now();
        let total = jobs.len();
        let mut state = PoolState::new(jobs);
        let mut aggregator = ResultAggregator::new();
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();

        tracing::info!(
            jobs = total,
            max_concurrency = self.config.max_concurrency,
            timeout_ms = self.config.per_job_timeout.as_millis() as u64,
            "batch started"
        );

        self.fill(&mut state, &events_tx);
        while !state.is_complete() {
            let Some(event) = events_rx.recv().await else {
                break;
            };
            match event {
                PoolEvent::Finished { job, outcome } => {
                    if let Some(job) = self.retry_or_record(job, outcome, &mut aggregator, total, &events_tx) {
                        tracing::trace!(job = %job.name, "slot kept for retry");
                        continue;
                    }
                    state.release();
                    self.fill(&mut state, &events_tx);
                }
                PoolEvent::RetryReady(job) => {
                    tracing::debug!(job = %job.name, attempt = job.attempt, "re-admitting after retry delay");
                    self.launch(job, &events_tx);
                }
            }
        }

        let report = aggregator.into_report(started.elapsed());
        tracing::info!(
            succeeded = report.results.len(),
            failed = report.errors.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "batch complete"
        );
        report
    }

    /// Admit backlog jobs until the ceiling is reached or the backlog is empty.
    fn fill(&self, state: &mut PoolState, events: &UnboundedSender<PoolEvent>) {
        while let Some(job) = state.admit(self.config.max_concurrency) {
            tracing::debug!(
                job = %job.name,
                active = state.active(),
                pending = state.pending(),
                "admitted"
            );
            self.launch(job, events);
        }
    }

    fn launch(&self, job: JobDescriptor, events: &UnboundedSender<PoolEvent>) {
        let executor = Arc::clone(&self.executor);
        let events = events.clone();
        let timeout = self.config.per_job_timeout;
        tokio::spawn(async move {
            let outcome = supervise(executor.as_ref(), &job, timeout).await;
            let _ = events.send(PoolEvent::Finished { job, outcome });
        });
    }

    /// Either schedule a retry (returning the job, whose slot stays taken) or
    /// record the terminal outcome and return `None`.
    fn retry_or_record(
        &self,
        mut job: JobDescriptor,
        outcome: Outcome,
        aggregator: &mut ResultAggregator,
        total: usize,
        events: &UnboundedSender<PoolEvent>,
    ) -> Option<JobDescriptor> {
        let error = match &outcome {
            Outcome::Success(_) => None,
            Outcome::Failure(failure) => {
                match self.config.retry.decide(job.attempt, &failure.reason) {
                    RetryDecision::RetryAfter(delay) => {
                        tracing::info!(
                            job = %job.name,
                            attempt = job.attempt,
                            max_attempts = self.config.retry.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            "attempt failed ({}); retrying",
                            failure.reason
                        );
                        job.next_attempt();
                        self.notify(ProgressEvent::Retrying {
                            name: job.name.clone(),
                            attempt: job.attempt,
                            max_attempts: self.config.retry.max_attempts,
                            delay,
                        });
                        let events = events.clone();
                        let retry = job.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(delay).await;
                            let _ = events.send(PoolEvent::RetryReady(retry));
                        });
                        return Some(job);
                    }
                    RetryDecision::GiveUp => {
                        tracing::warn!(
                            job = %job.name,
                            attempts = job.attempt,
                            "job failed: {}",
                            failure.reason
                        );
                        Some(failure.reason.to_string())
                    }
                }
            }
        };

        let name = outcome.name().to_string();
        let success = outcome.is_success();
        let elapsed_ms = outcome.elapsed_ms();
        aggregator.record(outcome);
        self.notify(ProgressEvent::Completed {
            index: aggregator.recorded(),
            total,
            name,
            success,
            elapsed_ms,
            error,
        });
        None
    }

    fn notify(&self, event: ProgressEvent) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(event);
        }
    }
}
