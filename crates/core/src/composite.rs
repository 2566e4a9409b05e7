//! Local fallback compositor.
//!
//! Used when the remote generator is unavailable, errors, or answers without
//! an image. The output is deliberately naive: either the two inputs pasted
//! next to each other or a 50/50 alpha blend.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbImage};

use crate::error::CoreError;

/// Edge length of each tile in the side-by-side fallback.
pub const SIDE_BY_SIDE_TILE: u32 = 512;

/// Default longest edge for images sent to the remote generator.
pub const DEFAULT_MAX_INPUT_DIMENSION: u32 = 1024;

/// How the fallback result is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackMode {
    /// Person on the left, garment on the right, each 512x512.
    #[default]
    SideBySide,
    /// Garment scaled to the person's size and mixed 50/50.
    Blend,
}

impl FallbackMode {
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "side_by_side" => Ok(Self::SideBySide),
            "blend" => Ok(Self::Blend),
            other => Err(CoreError::Validation(format!(
                "Unknown fallback mode '{other}'. Must be one of: side_by_side, blend"
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SideBySide => "side_by_side",
            Self::Blend => "blend",
        }
    }
}

/// Decode any supported image payload.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, CoreError> {
    Ok(image::load_from_memory(bytes)?)
}

/// Paste both images, resized to 512x512, into a 1024x512 canvas.
pub fn side_by_side(person: &DynamicImage, garment: &DynamicImage) -> RgbImage {
    let tile = SIDE_BY_SIDE_TILE;
    let left = imageops::resize(&person.to_rgb8(), tile, tile, FilterType::Triangle);
    let right = imageops::resize(&garment.to_rgb8(), tile, tile, FilterType::Triangle);

    let mut canvas = RgbImage::new(tile * 2, tile);
    imageops::replace(&mut canvas, &left, 0, 0);
    imageops::replace(&mut canvas, &right, i64::from(tile), 0);
    canvas
}

/// Mix the garment over the person at equal weight. The output keeps the
/// person's dimensions.
pub fn blend(person: &DynamicImage, garment: &DynamicImage) -> RgbImage {
    let base = person.to_rgb8();
    let (width, height) = base.dimensions();
    let overlay = imageops::resize(&garment.to_rgb8(), width, height, FilterType::Triangle);

    let mut out = base;
    for (dst, src) in out.pixels_mut().zip(overlay.pixels()) {
        for channel in 0..3 {
            let sum = u16::from(dst.0[channel]) + u16::from(src.0[channel]);
            // Rounded mean; cannot exceed 255.
            dst.0[channel] = ((sum + 1) / 2) as u8;
        }
    }
    out
}

/// Downscale so neither side exceeds `max_dim`, keeping the aspect ratio.
///
/// Returns `None` when the image already fits; images are never upscaled.
pub fn fit_within(img: &DynamicImage, max_dim: u32) -> Option<DynamicImage> {
    if max_dim == 0 || (img.width() <= max_dim && img.height() <= max_dim) {
        return None;
    }
    Some(img.resize(max_dim, max_dim, FilterType::Triangle))
}

/// Build the fallback result from already decoded images.
pub fn compose_images(mode: FallbackMode, person: &DynamicImage, garment: &DynamicImage) -> RgbImage {
    match mode {
        FallbackMode::SideBySide => side_by_side(person, garment),
        FallbackMode::Blend => blend(person, garment),
    }
}

/// Decode both uploads and build the fallback result.
pub fn compose(
    mode: FallbackMode,
    person_bytes: &[u8],
    garment_bytes: &[u8],
) -> Result<RgbImage, CoreError> {
    let person = decode(person_bytes)?;
    let garment = decode(garment_bytes)?;
    Ok(compose_images(mode, &person, &garment))
}

/// Encode an RGB image as PNG.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, CoreError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}
