//! Sticker service: upload compression and default sticker loading.
//!
//! DESIGN
//! ======
//! Image work is CPU-bound, so it runs on the blocking pool and the async
//! handler only awaits the result. Default stickers are prepared once from
//! a directory on disk; a file that fails to decode is logged and skipped
//! so one bad asset cannot hide the rest.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::StickerConfig;
use crate::sticker::{self, AvifStickerEncoder, EncodedSticker, StickerError};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "webp", "avif"];

#[derive(Debug, thiserror::Error)]
pub enum StickerServiceError {
    #[error("sticker upload is empty")]
    Empty,
    #[error("sticker upload too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },
    #[error(transparent)]
    Image(#[from] StickerError),
    #[error("sticker worker failed: {0}")]
    Worker(String),
    #[error("sticker directory unreadable: {0}")]
    Io(#[from] std::io::Error),
}

/// Compress an uploaded sticker to the configured budget.
///
/// # Errors
///
/// `Empty` or `TooLarge` before any decoding, `Image` when the bytes are
/// not a supported image or cannot be re-encoded.
pub async fn process_upload(config: &StickerConfig, bytes: Vec<u8>) -> Result<EncodedSticker, StickerServiceError> {
    if bytes.is_empty() {
        return Err(StickerServiceError::Empty);
    }
    if bytes.len() > config.max_upload_bytes {
        return Err(StickerServiceError::TooLarge { size: bytes.len(), limit: config.max_upload_bytes });
    }

    let budget = config.budget;
    let encoder = AvifStickerEncoder::new(config.avif_speed);
    let input_size = bytes.len();
    let encoded = tokio::task::spawn_blocking(move || sticker::compress_upload(&bytes, &budget, &encoder))
        .await
        .map_err(|e| StickerServiceError::Worker(e.to_string()))??;

    info!(
        input_size,
        output_size = encoded.bytes.len(),
        stored_len = encoded.stored_len(),
        width = encoded.width,
        height = encoded.height,
        quality = encoded.quality,
        mime = encoded.mime_type,
        "sticker processed"
    );
    Ok(encoded)
}

/// A prepared default sticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultSticker {
    pub name: String,
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Prepare every image in `dir`, sorted by file name.
///
/// # Errors
///
/// `Io` if the directory itself cannot be read. Individual files that fail
/// are skipped.
pub async fn load_default_stickers(dir: &Path, tolerance: f64) -> Result<Vec<DefaultSticker>, StickerServiceError> {
    let mut paths: Vec<PathBuf> = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_image_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut stickers = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "default sticker unreadable");
                continue;
            }
        };
        let prepared = tokio::task::spawn_blocking(move || sticker::prepare_default(&bytes, tolerance)).await;
        match prepared {
            Ok(Ok(encoded)) => stickers.push(DefaultSticker {
                name,
                data_uri: encoded.data_uri(),
                width: encoded.width,
                height: encoded.height,
            }),
            Ok(Err(e)) => warn!(path = %path.display(), error = %e, "default sticker skipped"),
            Err(e) => warn!(path = %path.display(), error = %e, "default sticker worker failed"),
        }
    }

    info!(dir = %dir.display(), count = stickers.len(), "default stickers prepared");
    Ok(stickers)
}

/// Default stickers for `config`, or none when no directory is configured.
///
/// # Errors
///
/// `Io` if the configured directory cannot be read.
pub async fn default_stickers(config: &StickerConfig) -> Result<Arc<Vec<DefaultSticker>>, StickerServiceError> {
    match &config.default_dir {
        Some(dir) => Ok(Arc::new(load_default_stickers(dir, config.tolerance).await?)),
        None => Ok(Arc::new(Vec::new())),
    }
}

#[cfg(test)]
#[path = "sticker_test.rs"]
mod tests;
