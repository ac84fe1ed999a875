//! Process-backed executor: every unit is a child OS process.
//!
//! The child receives a [`WorkerRequest`] as JSON on stdin and answers with
//! one [`UnitReport`] JSON line on stdout. The child is spawned with
//! `kill_on_drop`, so aborting the unit future kills the process.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use crate::job::JobDescriptor;
use crate::transform::ImageSettings;

use super::worker::WorkerRequest;
use super::{Executor, UnitExit, UnitFuture, UnitReport};

/// Launches each unit as `program args...`.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    program: PathBuf,
    args: Vec<OsString>,
    output_dir: PathBuf,
    settings: Arc<ImageSettings>,
    unit_threads: Option<usize>,
}

impl ProcessExecutor {
    pub fn new(
        program: impl Into<PathBuf>,
        args: impl IntoIterator<Item = impl Into<OsString>>,
        output_dir: impl Into<PathBuf>,
        settings: ImageSettings,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            output_dir: output_dir.into(),
            settings: Arc::new(settings),
            unit_threads: None,
        }
    }

    /// Cap the transformation threads each child may start.
    pub fn with_unit_threads(mut self, threads: usize) -> Self {
        self.unit_threads = Some(threads.max(1));
        self
    }

    /// Units run the `worker` subcommand of the current executable.
    pub fn current_exe(output_dir: impl Into<PathBuf>, settings: ImageSettings) -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?, ["worker"], output_dir, settings))
    }

    fn request_for(&self, job: &JobDescriptor) -> WorkerRequest {
        WorkerRequest {
            image_path: job.path.clone(),
            filename: job.name.clone(),
            output_dir: self.output_dir.clone(),
            settings: (*self.settings).clone(),
            threads: self.unit_threads,
        }
    }
}

impl Executor for ProcessExecutor {
    fn launch(&self, job: &JobDescriptor) -> UnitFuture {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        let request = self.request_for(job);
        Box::pin(run_child(command, request))
    }
}

async fn run_child(mut command: Command, request: WorkerRequest) -> UnitExit {
    let name = request.filename.clone();
    let spawn_failure = |message: String| {
        UnitExit::Reported(UnitReport::Failure {
            name: name.clone(),
            message,
            elapsed_ms: 0,
        })
    };

    let payload = match serde_json::to_vec(&request) {
        Ok(p) => p,
        Err(e) => return spawn_failure(format!("encode worker request: {}", e)),
    };
    let mut child = match command.spawn() {
        Ok(c) => c,
        Err(e) => return spawn_failure(format!("spawn worker: {}", e)),
    };
    tracing::debug!(job = %name, pid = child.id(), "worker process spawned");

    if let Some(mut stdin) = child.stdin.take() {
        // A child that exits early closes the pipe; its exit status tells the story.
        if let Err(e) = stdin.write_all(&payload).await {
            tracing::debug!(job = %name, "write worker request: {}", e);
        }
        drop(stdin);
    }

    let mut stdout = String::new();
    if let Some(mut out) = child.stdout.take() {
        if let Err(e) = out.read_to_string(&mut stdout).await {
            tracing::debug!(job = %name, "read worker report: {}", e);
        }
    }

    let code = match child.wait().await {
        Ok(status) => status.code().unwrap_or(-1),
        Err(e) => {
            tracing::warn!(job = %name, "wait for worker: {}", e);
            -1
        }
    };

    match parse_report(&stdout) {
        Some(report) => UnitExit::Reported(report),
        None => UnitExit::Exited(code),
    }
}

/// The report is the last non-empty stdout line that parses.
fn parse_report(stdout: &str) -> Option<UnitReport> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .find_map(|l| serde_json::from_str(l).ok())
}
