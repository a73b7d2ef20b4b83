//! Action protocol of the spreadsheet script.
//!
//! DESIGN
//! ======
//! Reads are `GET ?action=getCards` / `GET ?action=getCard&id=...`. Writes are
//! `POST` with a JSON body tagged by `action`, sent as `text/plain` so
//! browsers skip the CORS preflight. Every response is an [`Envelope`] with a
//! `success` flag; failures carry an `error` string rather than an HTTP
//! status. The `/exec` route serves this protocol and `SheetsCardStore`
//! speaks it as a client.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{Card, CardInput, StoreError};

pub const ACTION_GET_CARDS: &str = "getCards";
pub const ACTION_GET_CARD: &str = "getCard";

pub const ERROR_CARD_NOT_FOUND: &str = "Card not found";
pub const ERROR_INVALID_ACTION: &str = "Invalid action";

/// Write actions, tagged by the `action` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PostAction {
    AddCard {
        card: CardInput,
    },
    UpdateCard {
        id: Uuid,
        card: CardInput,
    },
    DeleteCard {
        id: Uuid,
    },
    #[serde(rename_all = "camelCase")]
    UpdatePosition {
        id: Uuid,
        position_x: f64,
        position_y: f64,
    },
    #[serde(rename_all = "camelCase")]
    VerifyPassword {
        id: Uuid,
        password_hash: String,
    },
}

/// Query string of a read request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetQuery {
    pub action: Option<String>,
    pub id: Option<String>,
}

/// Response body shared by every action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<Card>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
}

impl Envelope {
    #[must_use]
    pub fn ok() -> Self {
        Self { success: true, ..Self::default() }
    }

    #[must_use]
    pub fn fail(error: impl Into<String>) -> Self {
        Self { success: false, error: Some(error.into()), ..Self::default() }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Failure envelope for a store error. Missing cards use the fixed
    /// "Card not found" text clients match on.
    #[must_use]
    pub fn from_store_error(err: &StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::fail(ERROR_CARD_NOT_FOUND),
            other => Self::fail(other.to_string()),
        }
    }

    /// Turn a received envelope back into a store result for card `id`.
    ///
    /// # Errors
    ///
    /// `NotFound` for the "Card not found" error, `Remote` for any other.
    pub fn into_result(self, id: Option<Uuid>) -> Result<Self, StoreError> {
        if self.success {
            return Ok(self);
        }
        let error = self.error.unwrap_or_else(|| "unknown remote error".to_string());
        match id {
            Some(id) if error == ERROR_CARD_NOT_FOUND => Err(StoreError::NotFound(id)),
            _ => Err(StoreError::Remote(error)),
        }
    }
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
