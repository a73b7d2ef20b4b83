//! Sticker encoders and the encoded result.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::avif::AvifEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use serde::Serialize;

use super::StickerError;

/// Encodes an RGBA buffer at a quality percentage.
pub trait StickerEncoder: Send + Sync {
    fn mime_type(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns `Encode` if the codec rejects the buffer.
    fn encode(&self, image: &RgbaImage, quality: u8) -> Result<Vec<u8>, StickerError>;
}

pub const DEFAULT_AVIF_SPEED: u8 = 8;

/// Lossy AVIF with alpha. Quality maps directly onto the codec's 1-100 scale.
#[derive(Debug, Clone, Copy)]
pub struct AvifStickerEncoder {
    speed: u8,
}

impl AvifStickerEncoder {
    #[must_use]
    pub fn new(speed: u8) -> Self {
        Self { speed: speed.clamp(1, 10) }
    }
}

impl Default for AvifStickerEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_AVIF_SPEED)
    }
}

impl StickerEncoder for AvifStickerEncoder {
    fn mime_type(&self) -> &'static str {
        "image/avif"
    }

    fn encode(&self, image: &RgbaImage, quality: u8) -> Result<Vec<u8>, StickerError> {
        let mut out = Vec::new();
        let encoder = AvifEncoder::new_with_speed_quality(&mut out, self.speed, quality.clamp(1, 100));
        encoder
            .write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgba8)
            .map_err(|e| StickerError::Encode(e.to_string()))?;
        Ok(out)
    }
}

/// Lossless PNG. Quality is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngStickerEncoder;

impl StickerEncoder for PngStickerEncoder {
    fn mime_type(&self) -> &'static str {
        "image/png"
    }

    fn encode(&self, image: &RgbaImage, _quality: u8) -> Result<Vec<u8>, StickerError> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgba8)
            .map_err(|e| StickerError::Encode(e.to_string()))?;
        Ok(out)
    }
}

/// An encoded sticker ready to be stored on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedSticker {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

impl EncodedSticker {
    #[must_use]
    pub fn new(bytes: Vec<u8>, mime_type: &'static str, width: u32, height: u32, quality: u8) -> Self {
        Self { bytes, mime_type, width, height, quality }
    }

    #[must_use]
    pub fn empty(mime_type: &'static str) -> Self {
        Self::new(Vec::new(), mime_type, 0, 0, 0)
    }

    /// Length of [`Self::data_uri`], the form a card stores.
    #[must_use]
    pub fn stored_len(&self) -> usize {
        data_uri_len(self.mime_type, self.bytes.len())
    }

    /// `data:<mime>;base64,<payload>`
    #[must_use]
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

/// Length of the padded base64 data URI for `byte_len` bytes of `mime_type`.
#[must_use]
pub fn data_uri_len(mime_type: &str, byte_len: usize) -> usize {
    "data:".len() + mime_type.len() + ";base64,".len() + byte_len.div_ceil(3) * 4
}
