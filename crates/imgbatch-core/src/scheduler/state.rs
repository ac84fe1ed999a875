//! Pool bookkeeping: the backlog of jobs not yet admitted and the active count.
//!
//! Owned by the scheduler loop alone; units never see it.

use std::collections::VecDeque;

use crate::job::JobDescriptor;

#[derive(Debug, Default)]
pub struct PoolState {
    backlog: VecDeque<JobDescriptor>,
    active: usize,
}

impl PoolState {
    pub fn new(jobs: impl IntoIterator<Item = JobDescriptor>) -> Self {
        Self {
            backlog: jobs.into_iter().collect(),
            active: 0,
        }
    }

    /// Take the next backlog job if a slot is free under `max_concurrency`.
    /// Each admitted job counts as active until [`PoolState::release`].
    pub fn admit(&mut self, max_concurrency: usize) -> Option<JobDescriptor> {
        if self.active >= max_concurrency {
            return None;
        }
        let job = self.backlog.pop_front()?;
        self.active += 1;
        Some(job)
    }

    /// Free the slot of a job that reached a terminal outcome.
    pub fn release(&mut self) {
        debug_assert!(self.active > 0, "release without an active job");
        self.active = self.active.saturating_sub(1);
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn pending(&self) -> usize {
        self.backlog.len()
    }

    /// Backlog drained and no unit running or waiting to retry.
    pub fn is_complete(&self) -> bool {
        self.backlog.is_empty() && self.active == 0
    }
}
