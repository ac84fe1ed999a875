//! Worker side of the unit protocol: what runs inside an isolated unit.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::outcome::millis;
use crate::transform::{self, ImageSettings};

use super::UnitReport;

/// Everything a unit needs, handed over read-only when it is spawned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub image_path: PathBuf,
    pub filename: String,
    /// Batch output root; the unit writes under `<output_dir>/<file name>/`.
    pub output_dir: PathBuf,
    pub settings: ImageSettings,
    /// Size of the unit's transformation pool; `None` uses rayon's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

impl WorkerRequest {
    /// Job-specific output directory. Keyed by the whole file name, so
    /// `a.png` and `a.bmp` in one batch never share a directory.
    pub fn job_output_dir(&self) -> PathBuf {
        let name = Path::new(&self.filename)
            .file_name()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| self.filename.clone().into());
        self.output_dir.join(name)
    }
}

/// Process one image and build the report the unit sends back.
pub fn run_worker(request: &WorkerRequest) -> UnitReport {
    let started = Instant::now();
    let out_dir = request.job_output_dir();
    let process = || transform::process_image(&request.image_path, &out_dir, &request.settings);
    let result = match request.threads {
        Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n.max(1)).build() {
            Ok(pool) => pool.install(process),
            Err(e) => {
                tracing::warn!("build {}-thread transformation pool: {}; using global pool", n, e);
                process()
            }
        },
        None => process(),
    };
    match result {
        Ok(metadata) => {
            tracing::debug!(
                file = %request.filename,
                tasks = metadata.tasks_completed,
                "worker finished"
            );
            UnitReport::Success {
                name: request.filename.clone(),
                elapsed_ms: millis(started.elapsed()),
                metadata,
            }
        }
        Err(e) => {
            tracing::warn!(file = %request.filename, "worker failed: {:#}", e);
            UnitReport::Failure {
                name: request.filename.clone(),
                message: format!("{:#}", e),
                elapsed_ms: millis(started.elapsed()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{FitMode, Operation, TransformSpec};
    use image::{DynamicImage, Rgb, RgbImage};
    use tempfile::tempdir;

    fn request(dir: &Path, filename: &str) -> WorkerRequest {
        WorkerRequest {
            image_path: dir.join(filename),
            filename: filename.to_string(),
            output_dir: dir.join("out"),
            settings: ImageSettings {
                quality: 85,
                fit_mode: FitMode::Cover,
                transformations: vec![TransformSpec::new(
                    "small",
                    "small.jpg",
                    Operation::Resize { width: 8, height: 8 },
                )],
            },
            threads: Some(2),
        }
    }

    #[test]
    fn job_output_dir_uses_file_name() {
        let req = request(Path::new("/data"), "holiday.photo.png");
        assert_eq!(req.job_output_dir(), PathBuf::from("/data/out/holiday.photo.png"));
    }

    #[test]
    fn same_stem_jobs_get_distinct_dirs() {
        let png = request(Path::new("/data"), "a.png");
        let bmp = request(Path::new("/data"), "a.bmp");
        assert_ne!(png.job_output_dir(), bmp.job_output_dir());
    }

    #[test]
    fn request_without_threads_still_parses() {
        let req = request(Path::new("/data"), "a.png");
        let mut value = serde_json::to_value(&req).unwrap();
        value.as_object_mut().unwrap().remove("threads");
        let back: WorkerRequest = serde_json::from_value(value).unwrap();
        assert_eq!(back.threads, None);
    }

    #[test]
    fn reports_success_with_metadata() {
        let dir = tempdir().unwrap();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 12, Rgb([9, 9, 9])))
            .save(dir.path().join("cat.png"))
            .unwrap();
        let req = request(dir.path(), "cat.png");
        match run_worker(&req) {
            UnitReport::Success { name, metadata, .. } => {
                assert_eq!(name, "cat.png");
                assert_eq!(metadata.original_width, 16);
                assert_eq!(metadata.tasks_completed, 1);
            }
            other => panic!("expected success, got {:?}", other),
        }
        assert!(dir.path().join("out/cat.png/small.jpg").exists());
    }

    #[test]
    fn reports_failure_for_unreadable_image() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("broken.jpg"), b"not an image").unwrap();
        match run_worker(&request(dir.path(), "broken.jpg")) {
            UnitReport::Failure { name, message, .. } => {
                assert_eq!(name, "broken.jpg");
                assert!(message.contains("decode"), "{message}");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
