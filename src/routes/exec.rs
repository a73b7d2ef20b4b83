//! Spreadsheet-script action endpoint.
//!
//! Serves the [`crate::protocol`] actions straight against the configured
//! store, so an existing browser client or another instance's
//! `SheetsCardStore` can point at this server. Every response is HTTP 200;
//! success and failure live in the envelope.

use axum::extract::rejection::StringRejection;
use axum::extract::{Query, State};
use axum::response::Json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::protocol::{
    ACTION_GET_CARD, ACTION_GET_CARDS, ERROR_CARD_NOT_FOUND, ERROR_INVALID_ACTION, Envelope, GetQuery, PostAction,
};
use crate::state::AppState;
use crate::store::{CardStore, StoreError};

const POST_ACTIONS: [&str; 5] = ["addCard", "updateCard", "deleteCard", "updatePosition", "verifyPassword"];

/// `GET /exec?action=getCards|getCard&id=...`
pub async fn exec_get(State(state): State<AppState>, Query(query): Query<GetQuery>) -> Json<Envelope> {
    debug!(action = ?query.action, "exec get");
    let envelope = match query.action.as_deref() {
        Some(ACTION_GET_CARDS) => match state.store.list_cards().await {
            Ok(cards) => Envelope { cards: Some(cards), ..Envelope::ok() },
            Err(e) => store_failure(&e),
        },
        Some(ACTION_GET_CARD) => {
            match Uuid::parse_str(query.id.as_deref().unwrap_or_default()) {
                Ok(id) => match state.store.get_card(id).await {
                    Ok(card) => Envelope { card: Some(card), ..Envelope::ok() },
                    Err(e) => store_failure(&e),
                },
                Err(_) => Envelope::fail(ERROR_CARD_NOT_FOUND),
            }
        }
        _ => Envelope::fail(ERROR_INVALID_ACTION),
    };
    Json(envelope)
}

/// `POST /exec` with a JSON body tagged by `action`. The body is read as
/// plain text since clients send `text/plain`. An unreadable body, such as
/// one over the size limit, is still answered with an envelope.
pub async fn exec_post(State(state): State<AppState>, body: Result<String, StringRejection>) -> Json<Envelope> {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(status = %rejection.status(), error = %rejection.body_text(), "exec body rejected");
            return Json(Envelope::fail(format!("Invalid request body: {}", rejection.body_text())));
        }
    };
    let action = match parse_action(&body) {
        Ok(action) => action,
        Err(envelope) => return Json(envelope),
    };
    Json(dispatch(state.store.as_ref(), action).await)
}

/// Parse a POST body, mapping failures to the envelope the client sees.
pub(crate) fn parse_action(body: &str) -> Result<PostAction, Envelope> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| Envelope::fail(format!("Invalid JSON data: {e}")))?;
    let known = value
        .get("action")
        .and_then(serde_json::Value::as_str)
        .is_some_and(|action| POST_ACTIONS.contains(&action));
    if !known {
        return Err(Envelope::fail(ERROR_INVALID_ACTION));
    }
    serde_json::from_value(value).map_err(|e| Envelope::fail(format!("Invalid JSON data: {e}")))
}

pub(crate) async fn dispatch(store: &dyn CardStore, action: PostAction) -> Envelope {
    let result = match action {
        PostAction::AddCard { card } => store
            .add_card(card)
            .await
            .map(|id| Envelope { id: Some(id), ..Envelope::ok() }.with_message("Card added successfully")),
        PostAction::UpdateCard { id, card } => store
            .update_card(id, card)
            .await
            .map(|()| Envelope::ok().with_message("Card updated successfully")),
        PostAction::DeleteCard { id } => store
            .delete_card(id)
            .await
            .map(|()| Envelope::ok().with_message("Card deleted successfully")),
        PostAction::UpdatePosition { id, position_x, position_y } => store
            .update_position(id, crate::placement::Point::new(position_x, position_y))
            .await
            .map(|()| Envelope::ok().with_message("Position updated successfully")),
        PostAction::VerifyPassword { id, password_hash } => store
            .verify_password(id, &password_hash)
            .await
            .map(|valid| Envelope { valid: Some(valid), ..Envelope::ok() }),
    };
    result.unwrap_or_else(|e| store_failure(&e))
}

fn store_failure(err: &StoreError) -> Envelope {
    if !matches!(err, StoreError::NotFound(_)) {
        warn!(error = %err, "exec action failed");
    }
    Envelope::from_store_error(err)
}

#[cfg(test)]
#[path = "exec_test.rs"]
mod tests;
