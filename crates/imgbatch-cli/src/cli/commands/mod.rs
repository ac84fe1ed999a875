//! CLI command handlers. Each command is in its own file.

mod config;
mod run;
mod worker;

pub use config::run_show_config;
pub use run::{run_batch, RunOptions};
pub use worker::run_worker_command;
