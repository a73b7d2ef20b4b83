//! Card REST routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::placement::Point;
use crate::services::card::{self, CardDraft, CardError, ListOrder, Page};
use crate::state::AppState;
use crate::store::Card;

/// A card as the browser renders it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    #[serde(flatten)]
    pub card: Card,
    pub icon: &'static str,
}

impl From<Card> for CardView {
    fn from(card: Card) -> Self {
        let icon = card::ornament_icon(&card.ornament_type);
        Self { card, icon }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<usize>,
    /// Case-insensitive author name fragment.
    pub author: Option<String>,
    #[serde(default)]
    pub sort: ListOrder,
}

#[derive(Debug, Deserialize)]
pub struct PasswordBody {
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionBody {
    pub position_x: f64,
    pub position_y: f64,
}

/// A card id with the position it was given.
#[derive(Debug, Serialize)]
pub struct PlacedCard {
    pub id: Uuid,
    pub position: Point,
}

/// `GET /api/cards?page=N&author=..&sort=added|recent`: one page of cards.
pub async fn list_cards(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<CardView>>, StatusCode> {
    let cards = card::list_cards(state.store.as_ref())
        .await
        .map_err(card_error_to_status)?;
    let cards = card::select_cards(cards, query.author.as_deref(), query.sort).map_err(card_error_to_status)?;
    let page = card::paginate(&cards, query.page.unwrap_or(1), state.config.cards_per_page);
    Ok(Json(Page {
        items: page.items.into_iter().map(CardView::from).collect(),
        page: page.page,
        total_pages: page.total_pages,
        per_page: page.per_page,
        total: page.total,
    }))
}

/// `GET /api/cards/{id}`
pub async fn get_card(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<CardView>, StatusCode> {
    let card = card::get_card(state.store.as_ref(), id)
        .await
        .map_err(card_error_to_status)?;
    Ok(Json(card.into()))
}

/// `GET /api/cards/{id}/page`: page a shared card lives on.
pub async fn card_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let cards = card::list_cards(state.store.as_ref())
        .await
        .map_err(card_error_to_status)?;
    let page = card::page_of(&cards, id, state.config.cards_per_page).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(serde_json::json!({ "page": page })))
}

/// `POST /api/cards`: validate, place, and store a new card.
pub async fn create_card(
    State(state): State<AppState>,
    Json(body): Json<CardDraft>,
) -> Result<(StatusCode, Json<PlacedCard>), StatusCode> {
    let (id, position) = card::create_card(state.store.as_ref(), &state.profile, &state.config.placement, body)
        .await
        .map_err(card_error_to_status)?;
    Ok((StatusCode::CREATED, Json(PlacedCard { id, position })))
}

/// `PUT /api/cards/{id}`: replace content; needs the card password.
pub async fn update_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CardDraft>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    card::update_card(state.store.as_ref(), id, body)
        .await
        .map_err(card_error_to_status)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// `DELETE /api/cards/{id}`: needs the card password.
pub async fn delete_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PasswordBody>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    card::delete_card(state.store.as_ref(), id, &body.password)
        .await
        .map_err(card_error_to_status)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// `PATCH /api/cards/{id}/position`: move an ornament.
pub async fn move_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PositionBody>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let position = Point::new(body.position_x, body.position_y);
    card::move_card(state.store.as_ref(), id, position)
        .await
        .map_err(card_error_to_status)?;
    Ok(Json(serde_json::json!({ "ok": true, "position": position })))
}

/// `POST /api/cards/{id}/verify`
pub async fn verify_password(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PasswordBody>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let valid = card::verify_password(state.store.as_ref(), id, &body.password)
        .await
        .map_err(card_error_to_status)?;
    Ok(Json(serde_json::json!({ "valid": valid })))
}

/// `POST /api/cards/arrange`: re-place every ornament.
pub async fn arrange_cards(State(state): State<AppState>) -> Result<Json<Vec<PlacedCard>>, StatusCode> {
    let placed = card::arrange_all(state.store.as_ref(), &state.profile, &state.config.placement)
        .await
        .map_err(card_error_to_status)?;
    Ok(Json(placed.into_iter().map(|(id, position)| PlacedCard { id, position }).collect()))
}

pub(crate) fn card_error_to_status(err: CardError) -> StatusCode {
    match err {
        CardError::Validation(_) => StatusCode::BAD_REQUEST,
        CardError::NotFound(_) => StatusCode::NOT_FOUND,
        CardError::WrongPassword(_) => StatusCode::FORBIDDEN,
        CardError::Store(e) => {
            error!(error = %e, "card store failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
#[path = "cards_test.rs"]
mod tests;
