//! Sticker processor: background removal and size-budgeted encoding.
//!
//! DESIGN
//! ======
//! Two independent transforms over an owned RGBA buffer:
//! - `remove_background` estimates the background from the four corners and
//!   clears alpha on every pixel close to it, plus every near-white pixel.
//!   It is a per-pixel threshold, not a flood fill, so interior regions that
//!   match the background are cleared as well.
//! - `compress_to_budget` shrinks to the maximum dimensions, backs quality
//!   off in fixed steps, then makes one corrective resize pass. The result is
//!   best effort: a residual overage after that pass is returned as-is.
//!
//! The budget is measured on the stored form, the base64 data URI, not on
//! the raw encoded bytes.

pub mod encode;

use image::imageops::{self, FilterType};
use image::{GenericImageView, RgbaImage};
use tracing::{debug, warn};

pub use encode::{AvifStickerEncoder, EncodedSticker, PngStickerEncoder, StickerEncoder, data_uri_len};

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StickerError {
    #[error("image decode failed: {0}")]
    Decode(String),
    #[error("image encode failed: {0}")]
    Encode(String),
}

// =============================================================================
// BACKGROUND REMOVAL
// =============================================================================

pub const DEFAULT_TOLERANCE: f64 = 40.0;
const NEAR_WHITE: u8 = 240;

/// Make background-colored and near-white pixels transparent, in place.
///
/// The background color is the per-channel mean of the four corner pixels.
/// A pixel is cleared when every channel differs from that mean by less than
/// `tolerance`, or when all channels exceed 240. RGB values are untouched,
/// so applying this twice gives the same alpha channel as applying it once.
pub fn remove_background(image: &mut RgbaImage, tolerance: f64) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    let corners = [
        image.get_pixel(0, 0).0,
        image.get_pixel(width - 1, 0).0,
        image.get_pixel(0, height - 1).0,
        image.get_pixel(width - 1, height - 1).0,
    ];
    let mut avg = [0.0_f64; 3];
    for corner in &corners {
        for (sum, channel) in avg.iter_mut().zip(corner.iter()) {
            *sum += f64::from(*channel);
        }
    }
    #[allow(clippy::cast_precision_loss)]
    let count = corners.len() as f64;
    for sum in &mut avg {
        *sum /= count;
    }

    let mut cleared = 0_u64;
    for pixel in image.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        let near_background = [r, g, b]
            .iter()
            .zip(avg.iter())
            .all(|(c, mean)| (f64::from(*c) - mean).abs() < tolerance);
        let near_white = r > NEAR_WHITE && g > NEAR_WHITE && b > NEAR_WHITE;
        if near_background || near_white {
            pixel.0[3] = 0;
            cleared += 1;
        }
    }
    debug!(width, height, cleared, background = ?avg, "background removed");
}

// =============================================================================
// BUDGETED ENCODING
// =============================================================================

const QUALITY_STEP: u8 = 10;
const FALLBACK_QUALITY: u8 = 70;

/// Limits for [`compress_to_budget`]. Quality is a percentage (0.7 → 70).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingBudget {
    /// Longest data URI accepted, in characters.
    pub max_data_uri_len: usize,
    pub initial_quality: u8,
    pub min_quality: u8,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for EncodingBudget {
    /// Custom sticker uploads: a 2 MiB data URI at 1200x1200, starting at 70%.
    fn default() -> Self {
        Self {
            max_data_uri_len: 2 * 1024 * 1024,
            initial_quality: 70,
            min_quality: 30,
            max_width: 1200,
            max_height: 1200,
        }
    }
}

impl EncodingBudget {
    /// Dimensions after fitting `(width, height)` inside the maximum bounds,
    /// preserving aspect ratio and flooring to whole pixels.
    #[must_use]
    pub fn fit(&self, width: u32, height: u32) -> (u32, u32) {
        if width <= self.max_width && height <= self.max_height {
            return (width, height);
        }
        let scale = (f64::from(self.max_width) / f64::from(width)).min(f64::from(self.max_height) / f64::from(height));
        (scale_dim(width, scale), scale_dim(height, scale))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale_dim(dim: u32, scale: f64) -> u32 {
    ((f64::from(dim) * scale).floor() as u32).max(1)
}

/// Encode `image` so its data URI fits `budget.max_data_uri_len` where possible.
///
/// Steps: fit to the maximum dimensions; encode at the initial quality and
/// step quality down by 10 while over budget and above the floor; if still
/// over, resize by `sqrt(budget / data URI length)` and encode once more at 70.
///
/// A zero-area image produces an empty encoding without touching the encoder.
///
/// # Errors
///
/// Returns an error only if the encoder itself fails.
pub fn compress_to_budget(
    image: &RgbaImage,
    budget: &EncodingBudget,
    encoder: &dyn StickerEncoder,
) -> Result<EncodedSticker, StickerError> {
    let (src_width, src_height) = image.dimensions();
    if src_width == 0 || src_height == 0 {
        return Ok(EncodedSticker::empty(encoder.mime_type()));
    }

    let (width, height) = budget.fit(src_width, src_height);
    let working = if (width, height) == (src_width, src_height) {
        image.clone()
    } else {
        imageops::resize(image, width, height, FilterType::Triangle)
    };

    let mime_type = encoder.mime_type();
    let mut quality = budget.initial_quality;
    let mut bytes = encoder.encode(&working, quality)?;
    while data_uri_len(mime_type, bytes.len()) > budget.max_data_uri_len && quality > budget.min_quality {
        quality = quality.saturating_sub(QUALITY_STEP).max(budget.min_quality);
        bytes = encoder.encode(&working, quality)?;
        debug!(quality, size = data_uri_len(mime_type, bytes.len()), "re-encoded sticker at lower quality");
    }

    let stored = data_uri_len(mime_type, bytes.len());
    if stored <= budget.max_data_uri_len {
        return Ok(EncodedSticker::new(bytes, mime_type, width, height, quality));
    }

    #[allow(clippy::cast_precision_loss)]
    let scale = (budget.max_data_uri_len as f64 / stored as f64).sqrt();
    let (width, height) = (scale_dim(width, scale), scale_dim(height, scale));
    let shrunk = imageops::resize(image, width, height, FilterType::Triangle);
    let bytes = encoder.encode(&shrunk, FALLBACK_QUALITY)?;
    let stored = data_uri_len(mime_type, bytes.len());
    if stored > budget.max_data_uri_len {
        warn!(
            size = stored,
            budget = budget.max_data_uri_len,
            width,
            height,
            "sticker still over budget after resize pass"
        );
    }
    Ok(EncodedSticker::new(bytes, mime_type, width, height, FALLBACK_QUALITY))
}

/// Compress an uploaded image file.
///
/// When the upload's data URI already fits the budget and the dimension bounds,
/// its original bytes are returned unchanged. Otherwise it is decoded and
/// run through [`compress_to_budget`].
///
/// # Errors
///
/// Returns `Decode` if the bytes are not a supported image, or `Encode` if
/// re-encoding fails.
pub fn compress_upload(
    bytes: &[u8],
    budget: &EncodingBudget,
    encoder: &dyn StickerEncoder,
) -> Result<EncodedSticker, StickerError> {
    let format = image::guess_format(bytes).map_err(|e| StickerError::Decode(e.to_string()))?;
    let decoded = image::load_from_memory_with_format(bytes, format).map_err(|e| StickerError::Decode(e.to_string()))?;
    let (width, height) = decoded.dimensions();

    let stored = data_uri_len(format.to_mime_type(), bytes.len());
    if stored <= budget.max_data_uri_len && width <= budget.max_width && height <= budget.max_height {
        debug!(size = stored, width, height, "upload already within budget");
        return Ok(EncodedSticker::new(
            bytes.to_vec(),
            format.to_mime_type(),
            width,
            height,
            budget.initial_quality,
        ));
    }

    compress_to_budget(&decoded.to_rgba8(), budget, encoder)
}

/// Decode an image file, remove its background, and encode it losslessly.
///
/// # Errors
///
/// Returns `Decode` or `Encode` on codec failure.
pub fn prepare_default(bytes: &[u8], tolerance: f64) -> Result<EncodedSticker, StickerError> {
    let mut rgba = image::load_from_memory(bytes)
        .map_err(|e| StickerError::Decode(e.to_string()))?
        .to_rgba8();
    remove_background(&mut rgba, tolerance);
    let encoder = PngStickerEncoder;
    let (width, height) = rgba.dimensions();
    let bytes = encoder.encode(&rgba, 100)?;
    Ok(EncodedSticker::new(bytes, encoder.mime_type(), width, height, 100))
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
