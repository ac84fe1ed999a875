//! Job descriptor: one source image and the attempt it is on.

use std::path::{Path, PathBuf};

/// Immutable description of one unit of work. Only `attempt` changes, and only
/// through [`JobDescriptor::next_attempt`] when the job is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    /// Source image path.
    pub path: PathBuf,
    /// Display name (the file name), used in reports and output layout.
    pub name: String,
    /// 1-based attempt counter.
    pub attempt: u32,
}

impl JobDescriptor {
    /// Build a first-attempt job for `path`, naming it after the file name.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = display_name(&path);
        Self {
            path,
            name,
            attempt: 1,
        }
    }

    /// Build a job with an explicit display name.
    pub fn with_name(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            attempt: 1,
        }
    }

    /// Advance the attempt counter before the job is re-admitted.
    pub fn next_attempt(&mut self) {
        self.attempt = self.attempt.saturating_add(1);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
