//! In-process card store.

use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Card, CardInput, CardStore, StoreError, now_rfc3339};
use crate::placement::Point;

/// Cards held in insertion order behind a `RwLock`. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryCardStore {
    cards: RwLock<Vec<Card>>,
}

impl MemoryCardStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_cards(cards: Vec<Card>) -> Self {
        Self { cards: RwLock::new(cards) }
    }
}

#[async_trait::async_trait]
impl CardStore for MemoryCardStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list_cards(&self) -> Result<Vec<Card>, StoreError> {
        Ok(self.cards.read().await.clone())
    }

    async fn get_card(&self, id: Uuid) -> Result<Card, StoreError> {
        self.cards
            .read()
            .await
            .iter()
            .find(|card| card.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn add_card(&self, input: CardInput) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        let card = Card::from_input(id, input, &now_rfc3339());
        self.cards.write().await.push(card);
        Ok(id)
    }

    async fn update_card(&self, id: Uuid, input: CardInput) -> Result<(), StoreError> {
        let mut cards = self.cards.write().await;
        let card = cards
            .iter_mut()
            .find(|card| card.id == id)
            .ok_or(StoreError::NotFound(id))?;
        let mut updated = Card::from_input(id, input, &now_rfc3339());
        updated.created_at = std::mem::take(&mut card.created_at);
        *card = updated;
        Ok(())
    }

    async fn delete_card(&self, id: Uuid) -> Result<(), StoreError> {
        let mut cards = self.cards.write().await;
        let index = cards
            .iter()
            .position(|card| card.id == id)
            .ok_or(StoreError::NotFound(id))?;
        cards.remove(index);
        Ok(())
    }

    async fn update_position(&self, id: Uuid, position: Point) -> Result<(), StoreError> {
        let mut cards = self.cards.write().await;
        let card = cards
            .iter_mut()
            .find(|card| card.id == id)
            .ok_or(StoreError::NotFound(id))?;
        card.position_x = position.x;
        card.position_y = position.y;
        card.updated_at = now_rfc3339();
        Ok(())
    }

    async fn verify_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError> {
        let card = self.get_card(id).await?;
        Ok(card.password_hash == password_hash)
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
