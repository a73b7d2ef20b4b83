//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the card store behind a trait object, the tree silhouette used
//! for placement, the parsed config, and the default sticker set, which is
//! prepared on first request and then shared.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::config::Config;
use crate::placement::SilhouetteProfile;
use crate::services::sticker::{self, DefaultSticker, StickerServiceError};
use crate::store::CardStore;

/// Shared application state. Clone is required by Axum; every field is an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CardStore>,
    pub profile: Arc<SilhouetteProfile>,
    pub config: Arc<Config>,
    default_stickers: Arc<OnceCell<Arc<Vec<DefaultSticker>>>>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn CardStore>, config: Config) -> Self {
        Self {
            store,
            profile: Arc::new(SilhouetteProfile::tree()),
            config: Arc::new(config),
            default_stickers: Arc::new(OnceCell::new()),
        }
    }

    /// Prepared default stickers, loaded on first call.
    ///
    /// # Errors
    ///
    /// Returns the load error; the next call retries.
    pub async fn default_stickers(&self) -> Result<Arc<Vec<DefaultSticker>>, StickerServiceError> {
        self.default_stickers
            .get_or_try_init(|| sticker::default_stickers(&self.config.sticker))
            .await
            .cloned()
    }
}


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
