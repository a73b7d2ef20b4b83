//! Card store: record persistence behind a single trait.
//!
//! ARCHITECTURE
//! ============
//! Cards live in a flat table: one row per card, server-assigned ids, no
//! transactions, last writer wins. Three backends implement [`CardStore`]:
//! - `PgCardStore`: Postgres via SQLx.
//! - `SheetsCardStore`: a remote spreadsheet script spoken to over HTTP
//!   using the action protocol in [`crate::protocol`].
//! - `MemoryCardStore`: process-local, used for development and tests.

pub mod memory;
pub mod postgres;
pub mod sheets;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::placement::Point;

pub use memory::MemoryCardStore;
pub use postgres::PgCardStore;
pub use sheets::SheetsCardStore;

// =============================================================================
// TYPES
// =============================================================================

/// Whether an ornament opens an authored card or an external link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    #[default]
    Normal,
    Url,
}

impl CardType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Url => "url",
        }
    }

    /// Parse a stored value. Anything other than `url` is a normal card.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw == "url" { Self::Url } else { Self::Normal }
    }
}

/// A stored card. The password hash is accepted on input but never
/// serialized back out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: Uuid,
    pub author_name: String,
    #[serde(default, skip_serializing)]
    pub password_hash: String,
    pub ornament_type: String,
    #[serde(default)]
    pub position_x: f64,
    #[serde(default)]
    pub position_y: f64,
    #[serde(default)]
    pub card_type: CardType,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub card_data: serde_json::Value,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Card {
    /// Materialize a new card from its writable fields.
    #[must_use]
    pub fn from_input(id: Uuid, input: CardInput, now: &str) -> Self {
        Self {
            id,
            author_name: input.author_name,
            password_hash: input.password_hash,
            ornament_type: input.ornament_type,
            position_x: input.position_x,
            position_y: input.position_y,
            card_type: input.card_type,
            url: input.url.filter(|u| !u.is_empty()),
            card_data: input.card_data,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.position_x, self.position_y)
    }

    /// Last write time: `updated_at`, else `created_at`. `None` when the
    /// chosen stamp is not RFC 3339.
    #[must_use]
    pub fn last_touched(&self) -> Option<OffsetDateTime> {
        let stamp = if self.updated_at.is_empty() { &self.created_at } else { &self.updated_at };
        match OffsetDateTime::parse(stamp, &Rfc3339) {
            Ok(at) => Some(at),
            Err(_) => None,
        }
    }
}

/// Writable card fields. Ids and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInput {
    pub author_name: String,
    pub password_hash: String,
    pub ornament_type: String,
    #[serde(default)]
    pub position_x: f64,
    #[serde(default)]
    pub position_y: f64,
    #[serde(default)]
    pub card_type: CardType,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "empty_object")]
    pub card_data: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("card not found: {0}")]
    NotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("remote store error: {0}")]
    Remote(String),
    #[error("remote request failed: {0}")]
    Http(String),
    #[error("malformed store response: {0}")]
    Protocol(String),
}

// =============================================================================
// TRAIT
// =============================================================================

/// Card persistence actions. Unknown ids fail with [`StoreError::NotFound`].
#[async_trait::async_trait]
pub trait CardStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// All cards in insertion order.
    async fn list_cards(&self) -> Result<Vec<Card>, StoreError>;

    async fn get_card(&self, id: Uuid) -> Result<Card, StoreError>;

    /// Store a new card and return its assigned id.
    async fn add_card(&self, input: CardInput) -> Result<Uuid, StoreError>;

    /// Replace every writable field, keeping `created_at`.
    async fn update_card(&self, id: Uuid, input: CardInput) -> Result<(), StoreError>;

    async fn delete_card(&self, id: Uuid) -> Result<(), StoreError>;

    async fn update_position(&self, id: Uuid, position: Point) -> Result<(), StoreError>;

    /// Compare `password_hash` against the stored hash.
    async fn verify_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError>;
}

/// Current time as an RFC 3339 string.
#[must_use]
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
