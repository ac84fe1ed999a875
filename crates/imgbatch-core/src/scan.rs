//! Backlog source: the image files of an input directory.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::job::JobDescriptor;

/// Regular files directly inside `dir` whose extension is one of `formats`
/// (case-insensitive, without the dot), sorted by file name.
pub fn scan_images(dir: &Path, formats: &[String]) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("read input directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("list {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if has_supported_extension(&path, formats) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn has_supported_extension(path: &Path, formats: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    formats
        .iter()
        .any(|f| f.trim_start_matches('.').eq_ignore_ascii_case(ext))
}

/// One first-attempt job per path.
pub fn jobs_from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Vec<JobDescriptor> {
    paths.into_iter().map(JobDescriptor::new).collect()
}
