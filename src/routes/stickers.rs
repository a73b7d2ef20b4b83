//! Sticker upload and default sticker routes.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use serde::Serialize;
use tracing::{error, warn};

use crate::services::sticker::{self, DefaultSticker, StickerServiceError};
use crate::state::AppState;
use crate::sticker::{EncodedSticker, StickerError};

/// Compressed sticker, ready to embed in `cardData`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StickerResponse {
    pub data_uri: String,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub size: usize,
}

impl From<EncodedSticker> for StickerResponse {
    fn from(encoded: EncodedSticker) -> Self {
        Self {
            data_uri: encoded.data_uri(),
            mime_type: encoded.mime_type,
            width: encoded.width,
            height: encoded.height,
            quality: encoded.quality,
            size: encoded.bytes.len(),
        }
    }
}

fn is_image_upload(headers: &HeaderMap) -> bool {
    headers.get(CONTENT_TYPE).is_some_and(|v| {
        v.to_str()
            .is_ok_and(|v| v.trim().to_ascii_lowercase().starts_with("image/"))
    })
}

/// `POST /api/stickers`: raw image body, answered with the compressed sticker.
pub async fn upload_sticker(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StickerResponse>, StatusCode> {
    if !is_image_upload(&headers) {
        return Err(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
    let encoded = sticker::process_upload(&state.config.sticker, body.to_vec())
        .await
        .map_err(sticker_error_to_status)?;
    Ok(Json(encoded.into()))
}

/// `GET /api/stickers/defaults`
pub async fn default_stickers(State(state): State<AppState>) -> Result<Json<Vec<DefaultSticker>>, StatusCode> {
    let stickers = state
        .default_stickers()
        .await
        .map_err(sticker_error_to_status)?;
    Ok(Json(stickers.as_ref().clone()))
}

pub(crate) fn sticker_error_to_status(err: StickerServiceError) -> StatusCode {
    match err {
        StickerServiceError::Empty => StatusCode::BAD_REQUEST,
        StickerServiceError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        StickerServiceError::Image(StickerError::Decode(e)) => {
            warn!(error = %e, "sticker upload not decodable");
            StatusCode::UNPROCESSABLE_ENTITY
        }
        e @ (StickerServiceError::Image(StickerError::Encode(_))
        | StickerServiceError::Worker(_)
        | StickerServiceError::Io(_)) => {
            error!(error = %e, "sticker processing failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
#[path = "stickers_test.rs"]
mod tests;
