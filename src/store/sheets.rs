//! Remote spreadsheet card store.
//!
//! Talks to a deployed spreadsheet web-app script using the action protocol
//! in [`crate::protocol`]. The remote side has no transactions; each call is
//! one independent request and the last writer wins.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use uuid::Uuid;

use super::{Card, CardInput, CardStore, StoreError};
use crate::config::SheetsConfig;
use crate::placement::Point;
use crate::protocol::{ACTION_GET_CARD, ACTION_GET_CARDS, Envelope, PostAction};

pub struct SheetsCardStore {
    client: reqwest::Client,
    script_url: String,
}

impl SheetsCardStore {
    /// Build a client for the script at `config.script_url`.
    ///
    /// # Errors
    ///
    /// Returns `Http` if the HTTP client cannot be constructed.
    pub fn new(config: &SheetsConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| StoreError::Http(e.to_string()))?;
        Ok(Self { client, script_url: config.script_url.clone() })
    }

    async fn get(&self, action: &str, id: Option<Uuid>) -> Result<Envelope, StoreError> {
        // Cache buster, same as the browser client.
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default()
            .to_string();
        let mut query = vec![("action", action.to_string()), ("t", stamp)];
        if let Some(id) = id {
            query.push(("id", id.to_string()));
        }

        let resp = self
            .client
            .get(&self.script_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;
        parse_envelope(resp).await?.into_result(id)
    }

    async fn post(&self, action: &PostAction, id: Option<Uuid>) -> Result<Envelope, StoreError> {
        let body = serde_json::to_string(action).map_err(|e| StoreError::Protocol(e.to_string()))?;
        let resp = self
            .client
            .post(&self.script_url)
            .header(CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;
        parse_envelope(resp).await?.into_result(id)
    }
}

async fn parse_envelope(resp: reqwest::Response) -> Result<Envelope, StoreError> {
    let status = resp.status();
    let body = resp.text().await.map_err(|e| StoreError::Http(e.to_string()))?;
    if !status.is_success() {
        return Err(StoreError::Http(format!("status {status}: {body}")));
    }
    debug!(%status, bytes = body.len(), "sheets response");
    serde_json::from_str(&body).map_err(|e| StoreError::Protocol(format!("{e}: {body}")))
}

#[async_trait::async_trait]
impl CardStore for SheetsCardStore {
    fn backend(&self) -> &'static str {
        "sheets"
    }

    async fn list_cards(&self) -> Result<Vec<Card>, StoreError> {
        let envelope = self.get(ACTION_GET_CARDS, None).await?;
        Ok(envelope.cards.unwrap_or_default())
    }

    async fn get_card(&self, id: Uuid) -> Result<Card, StoreError> {
        let envelope = self.get(ACTION_GET_CARD, Some(id)).await?;
        envelope
            .card
            .ok_or_else(|| StoreError::Protocol("getCard response without card".into()))
    }

    async fn add_card(&self, input: CardInput) -> Result<Uuid, StoreError> {
        let envelope = self.post(&PostAction::AddCard { card: input }, None).await?;
        envelope
            .id
            .ok_or_else(|| StoreError::Protocol("addCard response without id".into()))
    }

    async fn update_card(&self, id: Uuid, input: CardInput) -> Result<(), StoreError> {
        self.post(&PostAction::UpdateCard { id, card: input }, Some(id))
            .await?;
        Ok(())
    }

    async fn delete_card(&self, id: Uuid) -> Result<(), StoreError> {
        self.post(&PostAction::DeleteCard { id }, Some(id)).await?;
        Ok(())
    }

    async fn update_position(&self, id: Uuid, position: Point) -> Result<(), StoreError> {
        let action = PostAction::UpdatePosition { id, position_x: position.x, position_y: position.y };
        self.post(&action, Some(id)).await?;
        Ok(())
    }

    async fn verify_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError> {
        let action = PostAction::VerifyPassword { id, password_hash: password_hash.to_string() };
        let envelope = self.post(&action, Some(id)).await?;
        Ok(envelope.valid.unwrap_or(false))
    }
}

#[cfg(test)]
#[path = "sheets_test.rs"]
mod tests;
