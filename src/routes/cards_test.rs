use super::*;
use crate::state::test_helpers::*;
use crate::store::{CardType, StoreError};
use serde_json::json;

fn draft(author: &str, password: &str) -> CardDraft {
    serde_json::from_value(json!({
        "authorName": author,
        "password": password,
        "ornamentType": "bell",
        "cardData": {"texts": [{"text": "Happy holidays"}]}
    }))
    .unwrap()
}

fn password(password: &str) -> Json<PasswordBody> {
    Json(PasswordBody { password: password.into() })
}

#[test]
fn card_error_to_status_maps_variants() {
    assert_eq!(card_error_to_status(CardError::Validation("x".into())), StatusCode::BAD_REQUEST);
    assert_eq!(card_error_to_status(CardError::NotFound(Uuid::nil())), StatusCode::NOT_FOUND);
    assert_eq!(card_error_to_status(CardError::WrongPassword(Uuid::nil())), StatusCode::FORBIDDEN);
    assert_eq!(
        card_error_to_status(CardError::Store(StoreError::Remote("down".into()))),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn card_view_flattens_card_with_icon() {
    let view = CardView::from(dummy_card("a", Point::new(100.0, 150.0)));
    let value = serde_json::to_value(&view).unwrap();
    assert_eq!(value["authorName"], "a");
    assert_eq!(value["icon"], "\u{2b50}");
    assert!(value.get("passwordHash").is_none());
}

#[tokio::test]
async fn list_cards_pages_ten_at_a_time() {
    let cards = (0..23).map(|i| dummy_card(&format!("a{i}"), Point::new(100.0, 150.0))).collect();
    let state = test_app_state_with_cards(cards);

    let Json(first) = list_cards(State(state.clone()), Query(ListQuery::default())).await.unwrap();
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.items[0].card.author_name, "a0");

    let query = ListQuery { page: Some(42), ..ListQuery::default() };
    let Json(last) = list_cards(State(state), Query(query)).await.unwrap();
    assert_eq!(last.page, 3);
    assert_eq!(last.items.len(), 3);
}

#[tokio::test]
async fn list_cards_searches_and_sorts_recent() {
    let mut old = dummy_card("Mina", Point::new(100.0, 150.0));
    old.updated_at = "2024-12-01T00:00:00Z".into();
    let mut other = dummy_card("Jun", Point::new(100.0, 150.0));
    other.updated_at = "2024-12-24T00:00:00Z".into();
    let mut fresh = dummy_card("mina two", Point::new(100.0, 150.0));
    fresh.updated_at = "2024-12-20T00:00:00Z".into();
    let state = test_app_state_with_cards(vec![old, other, fresh]);

    let query: ListQuery = serde_json::from_value(json!({"sort": "recent"})).unwrap();
    let Json(recent) = list_cards(State(state.clone()), Query(query)).await.unwrap();
    let names: Vec<&str> = recent.items.iter().map(|v| v.card.author_name.as_str()).collect();
    assert_eq!(names, vec!["Jun", "mina two", "Mina"]);

    let query: ListQuery = serde_json::from_value(json!({"author": "MINA", "sort": "recent"})).unwrap();
    let Json(mine) = list_cards(State(state.clone()), Query(query)).await.unwrap();
    let names: Vec<&str> = mine.items.iter().map(|v| v.card.author_name.as_str()).collect();
    assert_eq!(names, vec!["mina two", "Mina"]);
    assert_eq!(mine.total, 2);

    let query = ListQuery { author: Some(" ".into()), ..ListQuery::default() };
    let err = list_cards(State(state), Query(query)).await.unwrap_err();
    assert_eq!(err, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_cards_normalizes_legacy_positions() {
    let state = test_app_state_with_cards(vec![dummy_card("old", Point::new(300.0, 400.0))]);
    let query = ListQuery { page: Some(1), ..ListQuery::default() };
    let Json(page) = list_cards(State(state), Query(query)).await.unwrap();
    assert_eq!(page.items[0].card.position(), Point::new(100.0, 142.5));
}

#[tokio::test]
async fn get_card_and_page_lookup() {
    let cards: Vec<_> = (0..12).map(|i| dummy_card(&format!("a{i}"), Point::new(100.0, 150.0))).collect();
    let shared = cards[11].id;
    let state = test_app_state_with_cards(cards);

    let Json(view) = get_card(State(state.clone()), Path(shared)).await.unwrap();
    assert_eq!(view.card.id, shared);

    let Json(page) = card_page(State(state.clone()), Path(shared)).await.unwrap();
    assert_eq!(page, json!({"page": 2}));

    let missing = card_page(State(state.clone()), Path(Uuid::new_v4())).await.unwrap_err();
    assert_eq!(missing, StatusCode::NOT_FOUND);
    let missing = get_card(State(state), Path(Uuid::new_v4())).await.unwrap_err();
    assert_eq!(missing, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_card_returns_created_with_position() {
    let state = test_app_state();
    let (status, Json(created)) = create_card(State(state.clone()), Json(draft("Mina", "pw"))).await.unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let stored = state.store.get_card(created.id).await.unwrap();
    assert_eq!(stored.position(), created.position);
    assert_eq!(stored.card_type, CardType::Normal);
}

#[tokio::test]
async fn create_card_rejects_url_card_without_url() {
    let mut body = draft("Mina", "pw");
    body.card_type = CardType::Url;
    let err = create_card(State(test_app_state()), Json(body)).await.unwrap_err();
    assert_eq!(err, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_and_delete_need_password() {
    let card = dummy_card("a", Point::new(100.0, 150.0));
    let id = card.id;
    let state = test_app_state_with_cards(vec![card]);

    let err = update_card(State(state.clone()), Path(id), Json(draft("b", "wrong"))).await.unwrap_err();
    assert_eq!(err, StatusCode::FORBIDDEN);
    update_card(State(state.clone()), Path(id), Json(draft("b", TEST_PASSWORD))).await.unwrap();
    assert_eq!(state.store.get_card(id).await.unwrap().author_name, "b");

    let err = delete_card(State(state.clone()), Path(id), password("wrong")).await.unwrap_err();
    assert_eq!(err, StatusCode::FORBIDDEN);
    delete_card(State(state.clone()), Path(id), password(TEST_PASSWORD)).await.unwrap();
    assert!(state.store.list_cards().await.unwrap().is_empty());
}

#[tokio::test]
async fn verify_reports_validity() {
    let card = dummy_card("a", Point::new(100.0, 150.0));
    let id = card.id;
    let state = test_app_state_with_cards(vec![card]);

    let Json(ok) = verify_password(State(state.clone()), Path(id), password(TEST_PASSWORD)).await.unwrap();
    assert_eq!(ok, json!({"valid": true}));
    let Json(bad) = verify_password(State(state), Path(id), password("nope")).await.unwrap();
    assert_eq!(bad, json!({"valid": false}));
}

#[tokio::test]
async fn move_card_updates_position() {
    let card = dummy_card("a", Point::new(100.0, 150.0));
    let id = card.id;
    let state = test_app_state_with_cards(vec![card]);

    let body = Json(PositionBody { position_x: 75.0, position_y: 180.0 });
    move_card(State(state.clone()), Path(id), body).await.unwrap();
    assert_eq!(state.store.get_card(id).await.unwrap().position(), Point::new(75.0, 180.0));
}

#[tokio::test]
async fn arrange_cards_places_every_card() {
    let cards = (0..5).map(|i| dummy_card(&format!("a{i}"), Point::new(100.0, 150.0))).collect();
    let state = test_app_state_with_cards(cards);

    let Json(placed) = arrange_cards(State(state.clone())).await.unwrap();
    assert_eq!(placed.len(), 5);
    for entry in &placed {
        assert_eq!(state.store.get_card(entry.id).await.unwrap().position(), entry.position);
    }
}
