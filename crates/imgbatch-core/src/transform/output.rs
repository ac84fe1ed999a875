//! Encode a transformed image to disk; the file extension picks the format.

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `image` to `path`. JPEG output honours `quality` and drops alpha.
pub fn save(image: &DynamicImage, path: &Path, quality: u8) -> Result<()> {
    let format = ImageFormat::from_path(path)
        .with_context(|| format!("unknown output format for {}", path.display()))?;

    match format {
        ImageFormat::Jpeg => {
            let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            let encoder = JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100));
            DynamicImage::ImageRgb8(image.to_rgb8())
                .write_with_encoder(encoder)
                .with_context(|| format!("encode {}", path.display()))?;
            writer.flush().with_context(|| format!("flush {}", path.display()))?;
        }
        other => image
            .save_with_format(path, other)
            .with_context(|| format!("encode {}", path.display()))?,
    }
    Ok(())
}
