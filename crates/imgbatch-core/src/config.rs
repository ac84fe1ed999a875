use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::transform::{default_transformations, FitMode, ImageSettings, TransformSpec};

/// Input and output locations, relative to the working directory unless absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoriesConfig {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Default for DirectoriesConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("input-images"),
            output: PathBuf::from("multi-threaded-output"),
        }
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    /// Maximum concurrent execution units. Absent = available host parallelism.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
    /// Per-job timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            max_workers: None,
            timeout_ms: 60_000,
        }
    }
}

/// Retry settings for failed jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub enabled: bool,
    /// Maximum number of attempts per job (including the first).
    pub max_attempts: u32,
    /// Fixed delay between attempts in milliseconds.
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 2,
            delay_ms: 1000,
        }
    }
}

/// Image formats to pick up and the transformations to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Extensions (without dot, case-insensitive) admitted from the input directory.
    pub supported_formats: Vec<String>,
    pub quality: u8,
    pub fit_mode: FitMode,
    pub transformations: Vec<TransformSpec>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            supported_formats: ["jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            quality: 90,
            fit_mode: FitMode::Cover,
            transformations: default_transformations(),
        }
    }
}

impl ImageConfig {
    pub fn settings(&self) -> ImageSettings {
        ImageSettings {
            quality: self.quality,
            fit_mode: self.fit_mode,
            transformations: self.transformations.clone(),
        }
    }
}

/// Console output toggles for the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Print retry notices.
    pub verbose: bool,
    pub show_progress: bool,
    pub show_stats: bool,
    pub show_errors: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            verbose: true,
            show_progress: true,
            show_stats: true,
            show_errors: true,
        }
    }
}

/// Global configuration loaded from `~/.config/imgbatch/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub directories: DirectoriesConfig,
    pub workers: WorkersConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
    pub image: ImageConfig,
}

/// Invalid tunables; rejected before any job is admitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("max concurrency must be greater than 0")]
    InvalidConcurrency,
    #[error("per-job timeout must be greater than 0 ms")]
    InvalidTimeout,
    #[error("retry max_attempts must be at least 1")]
    InvalidMaxAttempts,
}

/// Immutable scheduler tunables resolved once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_concurrency: usize,
    pub per_job_timeout: Duration,
    pub retry: RetryPolicy,
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        if self.per_job_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts);
        }
        Ok(())
    }

    /// Threads each unit may use for its own transformations, so that all
    /// concurrent units together stay near the host's parallelism.
    pub fn threads_per_unit(&self) -> usize {
        (host_parallelism() / self.max_concurrency.max(1)).max(1)
    }
}

/// Number of parallel execution units the host offers (at least 1).
pub fn host_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl BatchConfig {
    /// Resolve and validate the scheduler tunables.
    pub fn pool_config(&self) -> Result<PoolConfig, ConfigError> {
        let cfg = PoolConfig {
            max_concurrency: self.workers.max_workers.unwrap_or_else(host_parallelism),
            per_job_timeout: Duration::from_millis(self.workers.timeout_ms),
            retry: RetryPolicy {
                enabled: self.retry.enabled,
                max_attempts: self.retry.max_attempts,
                delay: Duration::from_millis(self.retry.delay_ms),
            },
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("imgbatch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BatchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BatchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}

/// Load configuration from an explicit file. Missing sections take defaults.
pub fn load_from_path(path: &Path) -> Result<BatchConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: BatchConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
