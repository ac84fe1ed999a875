//! Console rendering of batch progress and results.

use anyhow::Result;
use imgbatch_core::config::{LoggingConfig, PoolConfig};
use imgbatch_core::report::BatchReport;
use imgbatch_core::scheduler::ProgressEvent;
use imgbatch_core::transform::ImageSettings;
use std::fmt::Write;
use std::path::Path;

pub fn banner(
    images: usize,
    pool: &PoolConfig,
    input: &Path,
    output: &Path,
    settings: &ImageSettings,
) -> String {
    let names: Vec<&str> = settings.enabled().map(|t| t.name.as_str()).collect();
    let mut s = String::new();
    let _ = writeln!(
        s,
        "Processing {} image(s) with up to {} worker(s)",
        images, pool.max_concurrency
    );
    let _ = writeln!(s, "  Input:  {}", input.display());
    let _ = writeln!(s, "  Output: {}", output.display());
    let _ = writeln!(
        s,
        "  Quality: {}, fit: {:?}, timeout: {}ms",
        settings.quality,
        settings.fit_mode,
        pool.per_job_timeout.as_millis()
    );
    let _ = write!(s, "  Transformations ({}): {}", names.len(), names.join(", "));
    s
}

/// One console line for a progress event, or `None` if the config hides it.
pub fn progress_line(event: &ProgressEvent, console: &LoggingConfig) -> Option<String> {
    match event {
        ProgressEvent::Completed {
            index,
            total,
            name,
            success: true,
            elapsed_ms,
            ..
        } if console.show_progress => Some(format!("✓ [{index}/{total}] {name} ({elapsed_ms}ms)")),
        ProgressEvent::Completed {
            index,
            total,
            name,
            success: false,
            error,
            ..
        } if console.show_progress => Some(format!(
            "✗ [{index}/{total}] {name} - {}",
            error.as_deref().unwrap_or("failed")
        )),
        ProgressEvent::Retrying {
            name,
            attempt,
            max_attempts,
            delay,
        } if console.verbose => Some(format!(
            "↻ {name}: retrying (attempt {attempt}/{max_attempts}) in {}ms",
            delay.as_millis()
        )),
        _ => None,
    }
}

pub fn summary_text(batch: &BatchReport, console: &LoggingConfig, output: &Path) -> String {
    let summary = batch.summary();
    let mut s = String::new();
    let _ = writeln!(s);
    let _ = writeln!(s, "Batch complete");
    let _ = writeln!(s, "  Succeeded: {}", summary.success_count);
    let _ = writeln!(s, "  Failed:    {}", summary.failure_count);
    if console.show_stats {
        let _ = writeln!(s, "  Total time: {}ms", summary.total_elapsed_ms);
        let _ = writeln!(s, "  Average per image: {:.1}ms", summary.average_per_job_ms);
        if let Some(avg) = summary.average_successful_processing_ms {
            let _ = writeln!(s, "  Average processing time (successful): {:.1}ms", avg);
        }
    }
    if console.show_errors && !batch.errors.is_empty() {
        let _ = writeln!(s, "Errors:");
        for e in &batch.errors {
            let _ = writeln!(s, "  - {}: {}", e.name, e.reason);
        }
    }
    if summary.success_count > 0 {
        let _ = writeln!(s, "Output written to {}", output.display());
    }
    s
}

/// Summary plus the error list, as pretty JSON.
pub fn json_report(batch: &BatchReport) -> Result<String> {
    let value = serde_json::json!({
        "summary": batch.summary(),
        "errors": batch.errors,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}
