//! End-to-end runs of the `imgbatch` binary over generated images.

use image::{DynamicImage, Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("in")).unwrap();
        Self { dir }
    }

    fn input(&self) -> PathBuf {
        self.dir.path().join("in")
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn add_image(&self, name: &str, w: u32, h: u32) {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([120, 60, 30])))
            .save(self.input().join(name))
            .unwrap();
    }

    fn write_config(&self, input: &Path) -> PathBuf {
        let path = self.dir.path().join("config.toml");
        let toml = format!(
            r#"
[directories]
input = "{input}"
output = "{output}"

[workers]
max_workers = 2
timeout_ms = 30000

[retry]
enabled = false

[image]
quality = 80

[[image.transformations]]
name = "small"
filename = "small.jpg"

[image.transformations.operation]
kind = "resize"
width = 8
height = 8

[[image.transformations]]
name = "gray"
filename = "gray.png"

[image.transformations.operation]
kind = "grayscale"
"#,
            input = input.display(),
            output = self.output().display(),
        );
        fs::write(&path, toml).unwrap();
        path
    }

    fn run(&self, config: &Path, extra: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_imgbatch"))
            .arg("--config")
            .arg(config)
            .arg("run")
            .args(extra)
            .env("XDG_STATE_HOME", self.dir.path().join("state"))
            .env("XDG_CONFIG_HOME", self.dir.path().join("config"))
            .output()
            .unwrap()
    }
}

#[test]
fn processes_batch_and_records_failures() {
    let ws = Workspace::new();
    ws.add_image("a.png", 32, 24);
    ws.add_image("a.bmp", 12, 20);
    ws.add_image("b.png", 16, 16);
    ws.add_image("c.bmp", 20, 10);
    fs::write(ws.input().join("broken.jpg"), b"definitely not a jpeg").unwrap();
    fs::write(ws.input().join("notes.txt"), b"ignored").unwrap();
    let config = ws.write_config(&ws.input());

    let out = ws.run(&config, &["--json"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["summary"]["success_count"], 4);
    assert_eq!(report["summary"]["failure_count"], 1);
    assert_eq!(report["errors"][0]["name"], "broken.jpg");
    assert_eq!(report["errors"][0]["reason"]["kind"], "execution_error");

    for name in ["a.png", "a.bmp", "b.png", "c.bmp"] {
        assert!(ws.output().join(name).join("small.jpg").is_file(), "{name}/small.jpg");
        assert!(ws.output().join(name).join("gray.png").is_file(), "{name}/gray.png");
    }

    // Same-stem inputs keep their own dimensions.
    let a_png = image::open(ws.output().join("a.png/gray.png")).unwrap();
    let a_bmp = image::open(ws.output().join("a.bmp/gray.png")).unwrap();
    assert_eq!((a_png.width(), a_png.height()), (32, 24));
    assert_eq!((a_bmp.width(), a_bmp.height()), (12, 20));
}

#[test]
fn human_output_shows_progress_and_summary() {
    let ws = Workspace::new();
    ws.add_image("only.png", 10, 10);
    let config = ws.write_config(&ws.input());

    let out = ws.run(&config, &[]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("✓ [1/1] only.png"), "{stdout}");
    assert!(stdout.contains("Succeeded: 1"), "{stdout}");
}

#[test]
fn empty_input_exits_zero() {
    let ws = Workspace::new();
    let config = ws.write_config(&ws.input());

    let out = ws.run(&config, &[]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("No image files found"));
}

#[test]
fn missing_input_directory_exits_one() {
    let ws = Workspace::new();
    let config = ws.write_config(&ws.dir.path().join("absent"));

    let out = ws.run(&config, &[]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("imgbatch error"));
}

#[test]
fn zero_workers_is_fatal() {
    let ws = Workspace::new();
    ws.add_image("a.png", 4, 4);
    let config = ws.write_config(&ws.input());

    let out = ws.run(&config, &["--workers", "0"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(!ws.output().exists());
}
