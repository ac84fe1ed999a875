pub mod config;
pub mod logging;

pub mod job;
pub mod outcome;
pub mod report;
pub mod retry;
pub mod scan;
pub mod scheduler;
pub mod transform;
pub mod unit;
