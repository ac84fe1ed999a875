//! Retry policy for failed job attempts.
//!
//! A pure decision function consulted by the scheduler after every failed
//! attempt. Success never reaches it.

mod policy;

pub use policy::{RetryDecision, RetryPolicy};
