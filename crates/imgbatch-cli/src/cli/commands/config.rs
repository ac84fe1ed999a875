//! `imgbatch config` – show where the configuration lives and what it resolves to.

use anyhow::{Context, Result};
use imgbatch_core::config::BatchConfig;
use std::path::Path;

pub fn run_show_config(path: &Path, cfg: &BatchConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(cfg).context("render config as TOML")?;
    println!("# Config file: {}", path.display());
    match cfg.pool_config() {
        Ok(pool) => println!(
            "# Effective workers: {}, timeout: {}ms",
            pool.max_concurrency,
            pool.per_job_timeout.as_millis()
        ),
        Err(e) => println!("# Invalid configuration: {}", e),
    }
    println!();
    print!("{}", rendered);
    Ok(())
}
