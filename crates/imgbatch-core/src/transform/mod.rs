//! Image transformations applied inside an execution unit.
//!
//! Decodes the source once, then applies every enabled transformation to its
//! own copy in parallel and writes each result under the job's output
//! directory. Pixel work is delegated to the `image` crate.

mod ops;
mod output;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::outcome::ImageMetadata;

pub use ops::apply;
pub use output::save;

/// How resize operations fit the target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Fill the box, cropping overflow.
    #[default]
    Cover,
    /// Fit inside the box, preserving aspect ratio.
    Contain,
    /// Stretch to the exact box.
    Fill,
}

/// One pixel operation with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    Resize { width: u32, height: u32 },
    Grayscale,
    /// Gaussian blur; radius 1..=100.
    Blur { radius: u32 },
    Sepia,
    Invert,
    /// -1.0..=1.0, 0 is unchanged.
    Brightness { value: f32 },
    /// -1.0..=1.0, 0 is unchanged.
    Contrast { value: f32 },
    /// Alpha multiplier, 0.0..=1.0.
    Opacity { value: f32 },
    /// Fraction of alpha removed, 0.0..=1.0.
    Fade { value: f32 },
    /// Clockwise degrees; quarter turns are exact, other angles grow the canvas.
    Rotate { degrees: i32 },
    FlipHorizontal,
    FlipVertical,
    Pixelate { size: u32 },
    /// Colour levels per channel, 2..=255.
    Posterize { levels: u32 },
    Normalize,
    /// Mix with the given colour at 50%.
    ColorTone { red: u8, green: u8, blue: u8 },
}

/// A named, toggleable transformation and the file it writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformSpec {
    pub name: String,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    /// Output file name inside the job directory; its extension picks the format.
    pub filename: String,
    pub operation: Operation,
}

fn enabled_default() -> bool {
    true
}

impl TransformSpec {
    pub fn new(name: &str, filename: &str, operation: Operation) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
            filename: filename.to_string(),
            operation,
        }
    }
}

/// Read-only settings handed to every unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSettings {
    /// JPEG quality, 1..=100.
    pub quality: u8,
    pub fit_mode: FitMode,
    pub transformations: Vec<TransformSpec>,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            quality: 90,
            fit_mode: FitMode::Cover,
            transformations: default_transformations(),
        }
    }
}

impl ImageSettings {
    pub fn enabled(&self) -> impl Iterator<Item = &TransformSpec> {
        self.transformations.iter().filter(|t| t.enabled)
    }
}

/// The stock variant set: five sizes, filters, adjustments, rotations, effects.
pub fn default_transformations() -> Vec<TransformSpec> {
    use Operation::*;
    let resize = |width, height| Resize { width, height };
    vec![
        TransformSpec::new("thumbnail", "thumbnail.jpg", resize(150, 150)),
        TransformSpec::new("small", "small.jpg", resize(300, 300)),
        TransformSpec::new("medium", "medium.jpg", resize(600, 600)),
        TransformSpec::new("large", "large.jpg", resize(1200, 1200)),
        TransformSpec::new("xlarge", "xlarge.jpg", resize(1920, 1920)),
        TransformSpec::new("grayscale", "grayscale.jpg", Grayscale),
        TransformSpec::new("blur", "blur.jpg", Blur { radius: 5 }),
        TransformSpec::new("sepia", "sepia.jpg", Sepia),
        TransformSpec::new("invert", "invert.jpg", Invert),
        TransformSpec::new("brightness", "brightness.jpg", Brightness { value: 0.2 }),
        TransformSpec::new("contrast", "contrast.jpg", Contrast { value: 0.3 }),
        TransformSpec::new("opacity", "opacity.png", Opacity { value: 0.8 }),
        TransformSpec::new("fade", "fade.jpg", Fade { value: 0.5 }),
        TransformSpec::new("rotate", "rotated.jpg", Rotate { degrees: 90 }),
        TransformSpec::new("rotate180", "rotate180.jpg", Rotate { degrees: 180 }),
        TransformSpec::new("rotate270", "rotate270.jpg", Rotate { degrees: 270 }),
        TransformSpec::new("flipHorizontal", "flip-h.jpg", FlipHorizontal),
        TransformSpec::new("flipVertical", "flip-v.jpg", FlipVertical),
        TransformSpec::new("pixelate", "pixelate.jpg", Pixelate { size: 10 }),
        TransformSpec::new("posterize", "posterize.jpg", Posterize { levels: 5 }),
        TransformSpec::new("normalize", "normalize.jpg", Normalize),
        TransformSpec::new(
            "colorTone",
            "color-tone.jpg",
            ColorTone {
                red: 255,
                green: 100,
                blue: 100,
            },
        ),
    ]
}

/// Decode `source`, apply every enabled transformation concurrently and write
/// the results into `out_dir`.
///
/// A failing transformation does not stop its siblings; once all have run,
/// any failures are reported together as one error.
pub fn process_image(source: &Path, out_dir: &Path, settings: &ImageSettings) -> Result<ImageMetadata> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("create output directory {}", out_dir.display()))?;

    let image = image::open(source).with_context(|| format!("decode {}", source.display()))?;
    let (original_width, original_height) = (image.width(), image.height());

    let tasks: Vec<&TransformSpec> = settings.enabled().collect();
    let results: Vec<(&str, Result<()>)> = tasks
        .par_iter()
        .map(|spec| {
            let res = apply(&spec.operation, &image, settings.fit_mode)
                .and_then(|out| save(&out, &out_dir.join(&spec.filename), settings.quality));
            (spec.name.as_str(), res)
        })
        .collect();

    let failed: Vec<String> = results
        .iter()
        .filter_map(|(name, res)| res.as_ref().err().map(|e| format!("{} ({:#})", name, e)))
        .collect();
    if !failed.is_empty() {
        for f in &failed {
            tracing::warn!(source = %source.display(), "transformation failed: {}", f);
        }
        anyhow::bail!("failed to process tasks: {}", failed.join(", "));
    }

    Ok(ImageMetadata {
        original_width,
        original_height,
        tasks_completed: tasks.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use tempfile::tempdir;

    fn write_sample(dir: &Path) -> std::path::PathBuf {
        let img = RgbImage::from_fn(40, 30, |x, y| Rgb([(x * 6) as u8, (y * 8) as u8, 128]));
        let path = dir.join("sample.png");
        DynamicImage::ImageRgb8(img).save(&path).unwrap();
        path
    }

    #[test]
    fn default_set_has_unique_output_files() {
        let specs = default_transformations();
        let mut names: Vec<&str> = specs.iter().map(|s| s.filename.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), specs.len());
    }

    #[test]
    fn processes_every_enabled_transformation() {
        let dir = tempdir().unwrap();
        let source = write_sample(dir.path());
        let out = dir.path().join("out").join("sample");
        let mut settings = ImageSettings::default();
        settings.transformations.retain(|t| {
            matches!(t.name.as_str(), "thumbnail" | "grayscale" | "opacity" | "rotate")
        });
        settings.transformations[1].enabled = false;

        let meta = process_image(&source, &out, &settings).unwrap();
        assert_eq!(meta.original_width, 40);
        assert_eq!(meta.original_height, 30);
        assert_eq!(meta.tasks_completed, 3);
        assert!(out.join("thumbnail.jpg").exists());
        assert!(!out.join("grayscale.jpg").exists());
        assert!(out.join("opacity.png").exists());
        let rotated = image::open(out.join("rotated.jpg")).unwrap();
        assert_eq!((rotated.width(), rotated.height()), (30, 40));
    }

    #[test]
    fn one_bad_transformation_fails_job_but_keeps_siblings() {
        let dir = tempdir().unwrap();
        let source = write_sample(dir.path());
        let out = dir.path().join("out");
        let settings = ImageSettings {
            quality: 80,
            fit_mode: FitMode::Fill,
            transformations: vec![
                TransformSpec::new("ok", "ok.jpg", Operation::Invert),
                TransformSpec::new("bad", "bad.jpg", Operation::Blur { radius: 0 }),
            ],
        };
        let err = process_image(&source, &out, &settings).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("failed to process tasks"), "{msg}");
        assert!(msg.contains("bad"), "{msg}");
        assert!(out.join("ok.jpg").exists());
    }

    #[test]
    fn missing_source_is_an_error() {
        let dir = tempdir().unwrap();
        let err = process_image(
            &dir.path().join("nope.jpg"),
            &dir.path().join("out"),
            &ImageSettings::default(),
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("decode"));
    }

    #[test]
    fn settings_toml_roundtrip() {
        let settings = ImageSettings::default();
        let text = toml::to_string_pretty(&settings).unwrap();
        let parsed: ImageSettings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }
}
