//! Map an [`Operation`] onto `image` crate calls.

use anyhow::{bail, Result};
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};

use super::{FitMode, Operation};

/// Apply `op` to a copy of `image`. The source is never modified.
pub fn apply(op: &Operation, image: &DynamicImage, fit: FitMode) -> Result<DynamicImage> {
    let out = match *op {
        Operation::Resize { width, height } => {
            if width == 0 || height == 0 {
                bail!("resize target must be non-zero, got {}x{}", width, height);
            }
            match fit {
                FitMode::Cover => image.resize_to_fill(width, height, FilterType::Lanczos3),
                FitMode::Contain => image.resize(width, height, FilterType::Lanczos3),
                FitMode::Fill => image.resize_exact(width, height, FilterType::Lanczos3),
            }
        }
        Operation::Grayscale => image.grayscale(),
        Operation::Blur { radius } => {
            if !(1..=100).contains(&radius) {
                bail!("blur radius must be in 1..=100, got {}", radius);
            }
            image.blur(radius as f32)
        }
        Operation::Sepia => map_rgba(image, sepia),
        Operation::Invert => {
            let mut copy = image.clone();
            copy.invert();
            copy
        }
        Operation::Brightness { value } => {
            image.brighten((value.clamp(-1.0, 1.0) * 255.0).round() as i32)
        }
        Operation::Contrast { value } => image.adjust_contrast(value.clamp(-1.0, 1.0) * 100.0),
        Operation::Opacity { value } => scale_alpha(image, value),
        Operation::Fade { value } => scale_alpha(image, 1.0 - value.clamp(0.0, 1.0)),
        Operation::Rotate { degrees } => match degrees.rem_euclid(360) {
            0 => image.clone(),
            90 => image.rotate90(),
            180 => image.rotate180(),
            270 => image.rotate270(),
            other => rotate_any(image, other as f32),
        },
        Operation::FlipHorizontal => image.fliph(),
        Operation::FlipVertical => image.flipv(),
        Operation::Pixelate { size } => {
            if size == 0 {
                bail!("pixelate size must be at least 1");
            }
            let (w, h) = (image.width(), image.height());
            image
                .resize_exact((w / size).max(1), (h / size).max(1), FilterType::Nearest)
                .resize_exact(w, h, FilterType::Nearest)
        }
        Operation::Posterize { levels } => {
            if !(2..=255).contains(&levels) {
                bail!("posterize levels must be in 2..=255, got {}", levels);
            }
            let steps = (levels - 1) as f32;
            map_rgba(image, move |[r, g, b, a]| {
                let q = |c: u8| ((c as f32 / 255.0 * steps).round() / steps * 255.0).round() as u8;
                [q(r), q(g), q(b), a]
            })
        }
        Operation::Normalize => normalize(image),
        Operation::ColorTone { red, green, blue } => map_rgba(image, move |[r, g, b, a]| {
            let mix = |c: u8, t: u8| ((c as u16 + t as u16) / 2) as u8;
            [mix(r, red), mix(g, green), mix(b, blue), a]
        }),
    };
    Ok(out)
}

fn map_rgba(image: &DynamicImage, f: impl Fn([u8; 4]) -> [u8; 4]) -> DynamicImage {
    let mut buf: RgbaImage = image.to_rgba8();
    for px in buf.pixels_mut() {
        *px = Rgba(f(px.0));
    }
    DynamicImage::ImageRgba8(buf)
}

fn sepia([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let clamp = |v: f32| v.round().min(255.0) as u8;
    [
        clamp(r * 0.393 + g * 0.769 + b * 0.189),
        clamp(r * 0.349 + g * 0.686 + b * 0.168),
        clamp(r * 0.272 + g * 0.534 + b * 0.131),
        a,
    ]
}

fn scale_alpha(image: &DynamicImage, factor: f32) -> DynamicImage {
    let factor = factor.clamp(0.0, 1.0);
    map_rgba(image, move |[r, g, b, a]| {
        [r, g, b, (a as f32 * factor).round() as u8]
    })
}

/// Clockwise rotation by an arbitrary angle. The canvas grows to the rotated
/// bounding box; uncovered corners are transparent. Nearest-neighbour sampling.
fn rotate_any(image: &DynamicImage, degrees: f32) -> DynamicImage {
    let src = image.to_rgba8();
    let (w, h) = (src.width() as f32, src.height() as f32);
    let (sin, cos) = degrees.to_radians().sin_cos();
    let out_w = (w * cos.abs() + h * sin.abs()).round().max(1.0) as u32;
    let out_h = (w * sin.abs() + h * cos.abs()).round().max(1.0) as u32;
    let (half_w, half_h) = (out_w as f32 / 2.0, out_h as f32 / 2.0);

    let out = RgbaImage::from_fn(out_w, out_h, |x, y| {
        // Map the output pixel centre back into source space.
        let dx = x as f32 + 0.5 - half_w;
        let dy = y as f32 + 0.5 - half_h;
        let sx = dx * cos + dy * sin + w / 2.0;
        let sy = -dx * sin + dy * cos + h / 2.0;
        if sx >= 0.0 && sy >= 0.0 && sx < w && sy < h {
            *src.get_pixel(sx as u32, sy as u32)
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    DynamicImage::ImageRgba8(out)
}

/// Stretch each colour channel so its darkest value maps to 0 and brightest to 255.
fn normalize(image: &DynamicImage) -> DynamicImage {
    let buf = image.to_rgba8();
    let mut lo = [u8::MAX; 3];
    let mut hi = [u8::MIN; 3];
    for px in buf.pixels() {
        for c in 0..3 {
            lo[c] = lo[c].min(px.0[c]);
            hi[c] = hi[c].max(px.0[c]);
        }
    }
    map_rgba(image, move |mut p| {
        for c in 0..3 {
            let span = hi[c].saturating_sub(lo[c]);
            if span > 0 {
                p[c] = ((p[c] - lo[c]) as u32 * 255 / span as u32) as u8;
            }
        }
        p
    })
}
