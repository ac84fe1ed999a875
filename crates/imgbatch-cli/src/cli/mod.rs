//! CLI for the imgbatch batch image processor.

mod commands;
mod report;

use anyhow::Result;
use clap::{Parser, Subcommand};
use imgbatch_core::config::{self, BatchConfig};
use imgbatch_core::logging::ProcessRole;
use std::path::PathBuf;

use commands::{run_batch, run_show_config, run_worker_command, RunOptions};

/// Top-level CLI for imgbatch.
#[derive(Debug, Parser)]
#[command(name = "imgbatch")]
#[command(about = "imgbatch: bounded-concurrency batch image processor", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/imgbatch/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Process every image in the input directory.
    Run {
        /// Input directory (overrides [directories].input).
        #[arg(long, value_name = "DIR")]
        input: Option<PathBuf>,
        /// Output directory (overrides [directories].output).
        #[arg(long, value_name = "DIR")]
        output: Option<PathBuf>,
        /// Maximum concurrent workers (overrides [workers].max_workers).
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
        /// Per-image timeout in milliseconds (overrides [workers].timeout_ms).
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
        /// Print the summary and errors as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Process one image described on stdin and report on stdout (internal).
    #[command(hide = true)]
    Worker,

    /// Show the config file path and the effective configuration.
    Config,
}

impl CliCommand {
    pub fn process_role(&self) -> ProcessRole {
        match self {
            CliCommand::Worker => ProcessRole::Worker,
            _ => ProcessRole::Scheduler,
        }
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            CliCommand::Run {
                input,
                output,
                workers,
                timeout_ms,
                json,
            } => {
                let cfg = load_config(self.config.as_ref())?;
                let opts = RunOptions {
                    input,
                    output,
                    workers,
                    timeout_ms,
                    json,
                };
                run_batch(cfg, opts).await?;
            }
            CliCommand::Worker => {
                if !run_worker_command().await? {
                    std::process::exit(1);
                }
            }
            CliCommand::Config => {
                let path = match &self.config {
                    Some(p) => p.clone(),
                    None => config::config_path()?,
                };
                let cfg = load_config(self.config.as_ref())?;
                run_show_config(&path, &cfg)?;
            }
        }

        Ok(())
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<BatchConfig> {
    let cfg = match path {
        Some(p) => config::load_from_path(p)?,
        None => config::load_or_init()?,
    };
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

#[cfg(test)]
mod tests;
