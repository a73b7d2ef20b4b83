//! Postgres card store.
//!
//! The `cards` table mirrors the spreadsheet layout column for column.
//! `row_order` keeps insertion order stable the way appended rows do.

use sqlx::PgPool;
use uuid::Uuid;

use super::{Card, CardInput, CardStore, CardType, StoreError, now_rfc3339};
use crate::placement::Point;

type CardRow = (
    Uuid,
    String,
    String,
    String,
    f64,
    f64,
    String,
    Option<String>,
    serde_json::Value,
    String,
    String,
);

const SELECT_CARD_COLUMNS: &str = "SELECT id, author_name, password_hash, ornament_type, position_x, position_y, \
     card_type, url, card_data, created_at, updated_at FROM cards";

fn card_from_row(row: CardRow) -> Card {
    let (
        id,
        author_name,
        password_hash,
        ornament_type,
        position_x,
        position_y,
        card_type,
        url,
        card_data,
        created_at,
        updated_at,
    ) = row;
    Card {
        id,
        author_name,
        password_hash,
        ornament_type,
        position_x,
        position_y,
        card_type: CardType::parse(&card_type),
        url,
        card_data,
        created_at,
        updated_at,
    }
}

pub struct PgCardStore {
    pool: PgPool,
}

impl PgCardStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn affected_or_not_found(rows: u64, id: Uuid) -> Result<(), StoreError> {
    if rows == 0 { Err(StoreError::NotFound(id)) } else { Ok(()) }
}

#[async_trait::async_trait]
impl CardStore for PgCardStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn list_cards(&self) -> Result<Vec<Card>, StoreError> {
        let rows = sqlx::query_as::<_, CardRow>(&format!("{SELECT_CARD_COLUMNS} ORDER BY row_order"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(card_from_row).collect())
    }

    async fn get_card(&self, id: Uuid) -> Result<Card, StoreError> {
        let row = sqlx::query_as::<_, CardRow>(&format!("{SELECT_CARD_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))?;
        Ok(card_from_row(row))
    }

    async fn add_card(&self, input: CardInput) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        let card = Card::from_input(id, input, &now_rfc3339());
        sqlx::query(
            "INSERT INTO cards (id, author_name, password_hash, ornament_type, position_x, position_y, \
             card_type, url, card_data, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(card.id)
        .bind(&card.author_name)
        .bind(&card.password_hash)
        .bind(&card.ornament_type)
        .bind(card.position_x)
        .bind(card.position_y)
        .bind(card.card_type.as_str())
        .bind(&card.url)
        .bind(&card.card_data)
        .bind(&card.created_at)
        .bind(&card.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_card(&self, id: Uuid, input: CardInput) -> Result<(), StoreError> {
        let card = Card::from_input(id, input, &now_rfc3339());
        let result = sqlx::query(
            "UPDATE cards SET author_name = $2, password_hash = $3, ornament_type = $4, position_x = $5, \
             position_y = $6, card_type = $7, url = $8, card_data = $9, updated_at = $10 WHERE id = $1",
        )
        .bind(id)
        .bind(&card.author_name)
        .bind(&card.password_hash)
        .bind(&card.ornament_type)
        .bind(card.position_x)
        .bind(card.position_y)
        .bind(card.card_type.as_str())
        .bind(&card.url)
        .bind(&card.card_data)
        .bind(&card.updated_at)
        .execute(&self.pool)
        .await?;
        affected_or_not_found(result.rows_affected(), id)
    }

    async fn delete_card(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        affected_or_not_found(result.rows_affected(), id)
    }

    async fn update_position(&self, id: Uuid, position: Point) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE cards SET position_x = $2, position_y = $3, updated_at = $4 WHERE id = $1")
            .bind(id)
            .bind(position.x)
            .bind(position.y)
            .bind(now_rfc3339())
            .execute(&self.pool)
            .await?;
        affected_or_not_found(result.rows_affected(), id)
    }

    async fn verify_password(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError> {
        let stored = sqlx::query_scalar::<_, String>("SELECT password_hash FROM cards WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))?;
        Ok(stored == password_hash)
    }
}

#[cfg(test)]
#[path = "postgres_test.rs"]
mod tests;
