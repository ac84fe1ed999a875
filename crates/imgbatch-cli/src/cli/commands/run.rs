//! `imgbatch run` – process every image of the input directory through the pool.

use anyhow::{Context, Result};
use imgbatch_core::config::BatchConfig;
use imgbatch_core::scan::{jobs_from_paths, scan_images};
use imgbatch_core::scheduler::{PoolScheduler, ProgressEvent};
use imgbatch_core::unit::ProcessExecutor;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::report;

/// Command-line overrides for one run.
#[derive(Debug, Default)]
pub struct RunOptions {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub workers: Option<usize>,
    pub timeout_ms: Option<u64>,
    pub json: bool,
}

impl RunOptions {
    fn apply(&self, cfg: &mut BatchConfig) {
        if let Some(input) = &self.input {
            cfg.directories.input = input.clone();
        }
        if let Some(output) = &self.output {
            cfg.directories.output = output.clone();
        }
        if let Some(workers) = self.workers {
            cfg.workers.max_workers = Some(workers);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            cfg.workers.timeout_ms = timeout_ms;
        }
    }
}

pub async fn run_batch(mut cfg: BatchConfig, opts: RunOptions) -> Result<()> {
    opts.apply(&mut cfg);
    let pool_cfg = cfg.pool_config().context("invalid configuration")?;
    let input = cfg.directories.input.clone();
    let output = cfg.directories.output.clone();

    let files = scan_images(&input, &cfg.image.supported_formats)?;
    if files.is_empty() {
        if opts.json {
            println!("{}", report::json_report(&Default::default())?);
        } else {
            println!("No image files found in {}", input.display());
            println!(
                "Supported formats: {}",
                cfg.image.supported_formats.join(", ")
            );
        }
        return Ok(());
    }

    std::fs::create_dir_all(&output)
        .with_context(|| format!("create output directory {}", output.display()))?;

    let settings = cfg.image.settings();
    if !opts.json {
        println!("{}", report::banner(files.len(), &pool_cfg, &input, &output, &settings));
    }

    let executor = ProcessExecutor::current_exe(&output, settings)
        .context("locate imgbatch executable for workers")?
        .with_unit_threads(pool_cfg.threads_per_unit());
    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::unbounded_channel::<ProgressEvent>();
    let scheduler = PoolScheduler::new(pool_cfg, Arc::new(executor))?.with_progress(progress_tx);

    let console = cfg.logging.clone();
    let quiet = opts.json;
    let progress_handle = tokio::spawn(async move {
        while let Some(event) = progress_rx.recv().await {
            if quiet {
                continue;
            }
            if let Some(line) = report::progress_line(&event, &console) {
                println!("{}", line);
            }
        }
    });

    let batch = scheduler.run(jobs_from_paths(files)).await;
    // Closes the progress channel so the printer drains and exits.
    drop(scheduler);
    let _ = progress_handle.await;

    if opts.json {
        println!("{}", report::json_report(&batch)?);
    } else {
        print!("{}", report::summary_text(&batch, &cfg.logging, &output));
    }
    Ok(())
}
