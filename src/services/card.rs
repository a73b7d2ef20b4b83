//! Card service: validation, password gating, placement, listing.
//!
//! DESIGN
//! ======
//! Passwords are hashed with SHA-256 (hex) before they reach a store; the
//! only check is equality against the stored hash. New cards get a
//! position from the placement sampler against every existing position,
//! after legacy pixel coordinates are normalized.
//!
//! TRADE-OFFS
//! ==========
//! Batch re-arrangement writes positions one card at a time. A failure
//! midway leaves earlier cards moved and later ones untouched, since the
//! stores have no transactions.

use std::cmp::Reverse;

use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use crate::placement::{self, PlacementParams, Point, SilhouetteProfile, legacy};
use crate::store::{Card, CardInput, CardStore, CardType, StoreError};

// =============================================================================
// ORNAMENTS
// =============================================================================

/// Known ornament types and their icons.
pub const ORNAMENT_TYPES: [(&str, &str); 7] = [
    ("star", "\u{2b50}"),
    ("snowman", "\u{26c4}"),
    ("gift", "\u{1f381}"),
    ("bauble", "\u{1f534}"),
    ("candy-cane", "\u{1f36d}"),
    ("bell", "\u{1f514}"),
    ("snowflake", "\u{2744}\u{fe0f}"),
];

const FALLBACK_ICON: &str = "\u{1f381}";

/// Icon for an ornament type; unknown types render as a gift.
#[must_use]
pub fn ornament_icon(kind: &str) -> &'static str {
    ORNAMENT_TYPES
        .iter()
        .find(|(name, _)| *name == kind)
        .map_or(FALLBACK_ICON, |(_, icon)| icon)
}

#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<String>()
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CardError {
    #[error("invalid card: {0}")]
    Validation(String),
    #[error("card not found: {0}")]
    NotFound(Uuid),
    #[error("wrong password for card {0}")]
    WrongPassword(Uuid),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for CardError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

// =============================================================================
// INPUT
// =============================================================================

/// Card fields as submitted by an author, with a plaintext password.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDraft {
    pub author_name: String,
    pub password: String,
    #[serde(default)]
    pub ornament_type: String,
    #[serde(default)]
    pub card_type: CardType,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub card_data: serde_json::Value,
}

impl CardDraft {
    /// Trim and check required fields.
    ///
    /// # Errors
    ///
    /// `Validation` when the author or password is blank, the ornament type
    /// is unknown, or a URL card has no URL.
    pub fn validate(mut self) -> Result<Self, CardError> {
        self.author_name = self.author_name.trim().to_string();
        self.password = self.password.trim().to_string();
        self.url = self.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());

        if self.author_name.is_empty() {
            return Err(CardError::Validation("author name is required".into()));
        }
        if self.password.is_empty() {
            return Err(CardError::Validation("password is required".into()));
        }
        if self.ornament_type.is_empty() {
            self.ornament_type = "gift".into();
        }
        if !ORNAMENT_TYPES.iter().any(|(name, _)| *name == self.ornament_type) {
            return Err(CardError::Validation(format!("unknown ornament type: {}", self.ornament_type)));
        }
        match self.card_type {
            CardType::Url if self.url.is_none() => {
                return Err(CardError::Validation("url is required for url cards".into()));
            }
            CardType::Normal => self.url = None,
            CardType::Url => {}
        }
        if self.card_data.is_null() {
            self.card_data = serde_json::json!({});
        }
        Ok(self)
    }

    fn into_input(self, password_hash: String, position: Point) -> CardInput {
        CardInput {
            author_name: self.author_name,
            password_hash,
            ornament_type: self.ornament_type,
            position_x: position.x,
            position_y: position.y,
            card_type: self.card_type,
            url: self.url,
            card_data: self.card_data,
        }
    }
}

// =============================================================================
// QUERIES
// =============================================================================

/// Copy of `card` with its stored position normalized.
#[must_use]
pub fn normalize_card(mut card: Card) -> Card {
    let position = legacy::normalize(card.position_x, card.position_y);
    card.position_x = position.x;
    card.position_y = position.y;
    card
}

/// Normalized positions of `cards`, the occupied set for a new placement.
#[must_use]
pub fn occupied_positions(cards: &[Card]) -> Vec<Point> {
    cards
        .iter()
        .map(|card| legacy::normalize(card.position_x, card.position_y))
        .collect()
}

/// All cards with positions normalized.
///
/// # Errors
///
/// Returns a store error if the listing fails.
pub async fn list_cards(store: &dyn CardStore) -> Result<Vec<Card>, CardError> {
    let cards = store.list_cards().await?;
    Ok(cards.into_iter().map(normalize_card).collect())
}

/// # Errors
///
/// `NotFound` for an unknown id.
pub async fn get_card(store: &dyn CardStore, id: Uuid) -> Result<Card, CardError> {
    Ok(normalize_card(store.get_card(id).await?))
}

/// Order of a card listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListOrder {
    /// Store insertion order, the order ornaments were hung.
    #[default]
    Added,
    /// Most recently written first.
    Recent,
}

/// Cards whose author name contains `query`, ignoring case.
///
/// # Errors
///
/// `Validation` for a blank query.
pub fn search_by_author(cards: Vec<Card>, query: &str) -> Result<Vec<Card>, CardError> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Err(CardError::Validation("search name is required".into()));
    }
    Ok(cards
        .into_iter()
        .filter(|card| card.author_name.to_lowercase().contains(&needle))
        .collect())
}

/// Newest first by [`Card::last_touched`]. Ties keep their order; cards
/// without a readable timestamp go last.
#[must_use]
pub fn recent_first(mut cards: Vec<Card>) -> Vec<Card> {
    cards.sort_by_cached_key(|card| Reverse(card.last_touched()));
    cards
}

/// Filter by author when `author` is given, then order.
///
/// # Errors
///
/// `Validation` for a blank author query.
pub fn select_cards(cards: Vec<Card>, author: Option<&str>, order: ListOrder) -> Result<Vec<Card>, CardError> {
    let cards = match author {
        Some(query) => search_by_author(cards, query)?,
        None => cards,
    };
    Ok(match order {
        ListOrder::Added => cards,
        ListOrder::Recent => recent_first(cards),
    })
}

/// One page of items.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub per_page: usize,
    pub total: usize,
}

/// Slice out page `page` (1-based). Requests past the end clamp to the last
/// page; there is always at least one page, possibly empty.
#[must_use]
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_pages = items.len().div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(items.len());
    Page { items: items[start..end].to_vec(), page, total_pages, per_page, total: items.len() }
}

/// Page number (1-based) that holds card `id`, used to open shared links.
#[must_use]
pub fn page_of(cards: &[Card], id: Uuid, per_page: usize) -> Option<usize> {
    let index = cards.iter().position(|card| card.id == id)?;
    Some(index / per_page.max(1) + 1)
}

// =============================================================================
// MUTATIONS
// =============================================================================

/// Validate, place, and store a new card.
///
/// # Errors
///
/// `Validation` for a bad draft, or a store error.
pub async fn create_card(
    store: &dyn CardStore,
    profile: &SilhouetteProfile,
    params: &PlacementParams,
    draft: CardDraft,
) -> Result<(Uuid, Point), CardError> {
    let draft = draft.validate()?;
    let existing = store.list_cards().await?;
    let occupied = occupied_positions(&existing);
    let position = placement::sample(profile, &occupied, params, &mut rand::rng());

    let password_hash = hash_password(&draft.password);
    let id = store
        .add_card(draft.into_input(password_hash, position))
        .await?;
    info!(%id, x = position.x, y = position.y, backend = store.backend(), "card created");
    Ok((id, position))
}

/// # Errors
///
/// `NotFound` for an unknown id.
pub async fn verify_password(store: &dyn CardStore, id: Uuid, password: &str) -> Result<bool, CardError> {
    Ok(store
        .verify_password(id, &hash_password(password.trim()))
        .await?)
}

async fn require_password(store: &dyn CardStore, id: Uuid, password: &str) -> Result<(), CardError> {
    if verify_password(store, id, password).await? {
        Ok(())
    } else {
        warn!(%id, "password check failed");
        Err(CardError::WrongPassword(id))
    }
}

/// Replace a card's content. The stored position and password are kept.
///
/// # Errors
///
/// `WrongPassword` if `draft.password` does not match, `Validation` for a
/// bad draft, `NotFound` for an unknown id.
pub async fn update_card(store: &dyn CardStore, id: Uuid, draft: CardDraft) -> Result<(), CardError> {
    let draft = draft.validate()?;
    require_password(store, id, &draft.password).await?;
    // Remote stores never echo the hash back; the verified one is identical.
    let password_hash = hash_password(&draft.password);
    let position = store.get_card(id).await?.position();
    store
        .update_card(id, draft.into_input(password_hash, position))
        .await?;
    info!(%id, "card updated");
    Ok(())
}

/// # Errors
///
/// `WrongPassword` or `NotFound`.
pub async fn delete_card(store: &dyn CardStore, id: Uuid, password: &str) -> Result<(), CardError> {
    require_password(store, id, password).await?;
    store.delete_card(id).await?;
    info!(%id, "card deleted");
    Ok(())
}

/// # Errors
///
/// `NotFound` for an unknown id.
pub async fn move_card(store: &dyn CardStore, id: Uuid, position: Point) -> Result<(), CardError> {
    store.update_position(id, position).await?;
    Ok(())
}

/// Re-place every card as one batch, in listing order.
///
/// # Errors
///
/// Returns the first store error; cards before it keep their new positions.
pub async fn arrange_all(
    store: &dyn CardStore,
    profile: &SilhouetteProfile,
    params: &PlacementParams,
) -> Result<Vec<(Uuid, Point)>, CardError> {
    let cards = store.list_cards().await?;
    let points = placement::arrange(profile, cards.len(), params, &mut rand::rng());

    let mut placed = Vec::with_capacity(cards.len());
    for (card, point) in cards.iter().zip(points) {
        store.update_position(card.id, point).await?;
        placed.push((card.id, point));
    }
    info!(count = placed.len(), "ornaments re-arranged");
    Ok(placed)
}

/// Rewrite stored legacy pixel coordinates as silhouette coordinates.
/// Returns the number of cards rewritten.
///
/// # Errors
///
/// Returns the first store error.
pub async fn migrate_legacy_positions(store: &dyn CardStore) -> Result<usize, CardError> {
    let cards = store.list_cards().await?;
    let mut migrated = 0;
    for card in &cards {
        if !legacy::is_legacy(card.position_x, card.position_y) {
            continue;
        }
        let position = legacy::normalize(card.position_x, card.position_y);
        store.update_position(card.id, position).await?;
        migrated += 1;
    }
    info!(migrated, total = cards.len(), "legacy positions migrated");
    Ok(migrated)
}

#[cfg(test)]
#[path = "card_test.rs"]
mod tests;
