//! `imgbatch worker` – the child side of an execution unit.
//!
//! Reads one `WorkerRequest` JSON document from stdin and prints exactly one
//! `UnitReport` line on stdout. Nothing else may go to stdout.

use anyhow::{Context, Result};
use imgbatch_core::unit::worker::{run_worker, WorkerRequest};
use imgbatch_core::unit::UnitReport;
use std::io::{Read, Write};

/// Returns whether the image was processed successfully.
pub async fn run_worker_command() -> Result<bool> {
    let report = tokio::task::spawn_blocking(|| -> Result<UnitReport> {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("read worker request from stdin")?;
        let request: WorkerRequest =
            serde_json::from_str(&input).context("parse worker request")?;
        tracing::debug!(file = %request.filename, threads = ?request.threads, "worker started");
        Ok(run_worker(&request))
    })
    .await
    .context("worker task")??;

    let line = serde_json::to_string(&report).context("encode unit report")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", line).context("write unit report")?;
    stdout.flush().context("flush unit report")?;

    Ok(matches!(report, UnitReport::Success { .. }))
}
