//! Pool scheduler.
//!
//! Runs a batch of jobs with at most `max_concurrency` execution units alive.
//! A single loop owns the backlog and active count and reacts to completion
//! events from units and retry timers: a terminal outcome frees a slot and
//! admits the next job; a retryable failure keeps its slot and re-launches
//! after the configured delay.

mod pool;
mod progress;
mod state;

pub use pool::PoolScheduler;
pub use progress::ProgressEvent;
pub use state::PoolState;
