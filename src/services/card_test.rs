use super::*;
use crate::store::MemoryCardStore;
use serde_json::json;

fn draft(author: &str, password: &str) -> CardDraft {
    CardDraft {
        author_name: author.into(),
        password: password.into(),
        ornament_type: "star".into(),
        card_type: CardType::Normal,
        url: None,
        card_data: json!({"texts": [{"text": "Merry"}]}),
    }
}

fn stored(author: &str, x: f64, y: f64) -> Card {
    Card::from_input(
        Uuid::new_v4(),
        CardInput {
            author_name: author.into(),
            password_hash: hash_password("pw"),
            ornament_type: "bell".into(),
            position_x: x,
            position_y: y,
            card_type: CardType::Normal,
            url: None,
            card_data: json!({}),
        },
        "2024-12-01T00:00:00Z",
    )
}

// =============================================================================
// ornaments + hashing
// =============================================================================

#[test]
fn ornament_icon_known_and_fallback() {
    assert_eq!(ornament_icon("star"), "\u{2b50}");
    assert_eq!(ornament_icon("snowflake"), "\u{2744}\u{fe0f}");
    assert_eq!(ornament_icon("reindeer"), "\u{1f381}");
}

#[test]
fn hash_password_is_sha256_hex() {
    assert_eq!(
        hash_password("abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert_eq!(hash_password("").len(), 64);
}

// =============================================================================
// validation
// =============================================================================

#[test]
fn validate_trims_and_defaults_ornament() {
    let mut d = draft("  Mina  ", " pw ");
    d.ornament_type = String::new();
    d.card_data = serde_json::Value::Null;
    let d = d.validate().unwrap();
    assert_eq!(d.author_name, "Mina");
    assert_eq!(d.password, "pw");
    assert_eq!(d.ornament_type, "gift");
    assert_eq!(d.card_data, json!({}));
}

#[test]
fn validate_rejects_blank_fields() {
    assert!(matches!(draft("  ", "pw").validate(), Err(CardError::Validation(_))));
    assert!(matches!(draft("Mina", "").validate(), Err(CardError::Validation(_))));
}

#[test]
fn validate_rejects_unknown_ornament() {
    let mut d = draft("Mina", "pw");
    d.ornament_type = "reindeer".into();
    assert!(matches!(d.validate(), Err(CardError::Validation(msg)) if msg.contains("reindeer")));
}

#[test]
fn validate_url_cards_need_url() {
    let mut d = draft("Mina", "pw");
    d.card_type = CardType::Url;
    d.url = Some("   ".into());
    assert!(matches!(d.clone().validate(), Err(CardError::Validation(_))));

    d.url = Some(" https://example.com ".into());
    assert_eq!(d.validate().unwrap().url.as_deref(), Some("https://example.com"));
}

#[test]
fn validate_normal_cards_drop_url() {
    let mut d = draft("Mina", "pw");
    d.url = Some("https://example.com".into());
    assert_eq!(d.validate().unwrap().url, None);
}

#[test]
fn draft_parses_client_json() {
    let d: CardDraft = serde_json::from_value(json!({
        "authorName": "Jun",
        "password": "pw",
        "ornamentType": "candy-cane",
        "cardType": "url",
        "url": "https://example.com"
    }))
    .unwrap();
    assert_eq!(d.card_type, CardType::Url);
    assert_eq!(d.card_data, serde_json::Value::Null);
}

// =============================================================================
// pagination
// =============================================================================

#[test]
fn paginate_slices_and_clamps() {
    let items: Vec<u32> = (0..25).collect();

    let first = paginate(&items, 1, 10);
    assert_eq!(first.items, (0..10).collect::<Vec<_>>());
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.total, 25);

    let last = paginate(&items, 3, 10);
    assert_eq!(last.items, (20..25).collect::<Vec<_>>());

    let past_end = paginate(&items, 99, 10);
    assert_eq!(past_end.page, 3);

    let zero = paginate(&items, 0, 10);
    assert_eq!(zero.page, 1);
}

#[test]
fn paginate_empty_has_one_page() {
    let page = paginate::<u32>(&[], 5, 10);
    assert_eq!(page.page, 1);
    assert_eq!(page.total_pages, 1);
    assert!(page.items.is_empty());
}

#[test]
fn page_of_finds_shared_card() {
    let cards: Vec<Card> = (0..23).map(|i| stored(&format!("a{i}"), 100.0, 150.0)).collect();
    assert_eq!(page_of(&cards, cards[0].id, 10), Some(1));
    assert_eq!(page_of(&cards, cards[9].id, 10), Some(1));
    assert_eq!(page_of(&cards, cards[10].id, 10), Some(2));
    assert_eq!(page_of(&cards, cards[22].id, 10), Some(3));
    assert_eq!(page_of(&cards, Uuid::new_v4(), 10), None);
}

// =============================================================================
// search + ordering
// =============================================================================

fn stamped(author: &str, created: &str, updated: &str) -> Card {
    let mut card = stored(author, 100.0, 150.0);
    card.created_at = created.into();
    card.updated_at = updated.into();
    card
}

fn authors(cards: &[Card]) -> Vec<&str> {
    cards.iter().map(|card| card.author_name.as_str()).collect()
}

#[test]
fn search_by_author_is_case_insensitive_substring() {
    let cards = vec![stored("Mina Park", 0.0, 0.0), stored("JUN", 0.0, 0.0), stored("minami", 0.0, 0.0)];
    let found = search_by_author(cards.clone(), "  MIN ").unwrap();
    assert_eq!(authors(&found), vec!["Mina Park", "minami"]);
    assert!(search_by_author(cards, "zzz").unwrap().is_empty());
}

#[test]
fn search_by_author_rejects_blank_query() {
    let cards = vec![stored("Mina", 0.0, 0.0)];
    assert!(matches!(search_by_author(cards, "   "), Err(CardError::Validation(_))));
}

#[test]
fn recent_first_uses_updated_then_created() {
    let cards = vec![
        stamped("old", "2024-12-01T00:00:00Z", ""),
        stamped("edited", "2024-11-01T00:00:00Z", "2024-12-20T08:00:00Z"),
        stamped("new", "2024-12-10T00:00:00Z", "2024-12-10T00:00:00Z"),
        stamped("broken", "yesterday", ""),
        stamped("zone", "2024-12-20T10:00:00+09:00", ""),
    ];
    // 10:00+09:00 is 01:00Z, before the 08:00Z edit.
    assert_eq!(authors(&recent_first(cards)), vec!["edited", "zone", "new", "old", "broken"]);
}

#[test]
fn recent_first_keeps_ties_in_insertion_order() {
    let cards = vec![
        stamped("a", "2024-12-01T00:00:00Z", ""),
        stamped("b", "2024-12-01T00:00:00Z", ""),
        stamped("c", "2024-12-01T00:00:00Z", ""),
    ];
    assert_eq!(authors(&recent_first(cards)), vec!["a", "b", "c"]);
}

#[test]
fn select_cards_filters_then_orders() {
    let cards = vec![
        stamped("Mina", "2024-12-01T00:00:00Z", ""),
        stamped("Jun", "2024-12-05T00:00:00Z", ""),
        stamped("mina again", "2024-12-03T00:00:00Z", ""),
    ];
    let added = select_cards(cards.clone(), None, ListOrder::Added).unwrap();
    assert_eq!(authors(&added), vec!["Mina", "Jun", "mina again"]);

    let mine = select_cards(cards, Some("mina"), ListOrder::Recent).unwrap();
    assert_eq!(authors(&mine), vec!["mina again", "Mina"]);
}

// =============================================================================
// normalization
// =============================================================================

#[test]
fn occupied_positions_normalize_legacy_and_missing() {
    let cards = vec![stored("a", 300.0, 400.0), stored("b", 0.0, 0.0), stored("c", 80.0, 90.0)];
    let occupied = occupied_positions(&cards);
    assert_eq!(occupied[0], Point::new(100.0, 142.5));
    assert_eq!(occupied[1], legacy::DEFAULT_POSITION);
    assert_eq!(occupied[2], Point::new(80.0, 90.0));
}

#[tokio::test]
async fn list_cards_returns_normalized_positions() {
    let store = MemoryCardStore::with_cards(vec![stored("a", 600.0, 800.0)]);
    let cards = list_cards(&store).await.unwrap();
    assert_eq!(cards[0].position(), Point::new(200.0, 295.0));
}

// =============================================================================
// mutations
// =============================================================================

#[tokio::test]
async fn create_card_places_inside_tree_and_hashes_password() {
    let store = MemoryCardStore::new();
    let profile = SilhouetteProfile::tree();
    let params = PlacementParams::default();

    let (id, position) = create_card(&store, &profile, &params, draft("Mina", "pw")).await.unwrap();

    let card = store.get_card(id).await.unwrap();
    assert_eq!(card.password_hash, hash_password("pw"));
    assert_eq!(card.position(), position);
    let (min_y, max_y) = profile.vertical_range().unwrap();
    assert!(position.y >= min_y && position.y <= max_y);
    let half = profile.width_at(position.y) / 2.0;
    assert!((position.x - profile.center_x()).abs() <= half);
}

#[tokio::test]
async fn create_card_avoids_existing_positions() {
    let store = MemoryCardStore::new();
    let profile = SilhouetteProfile::tree();
    let params = PlacementParams::default();

    let mut placed = Vec::new();
    for i in 0..8 {
        let (_, p) = create_card(&store, &profile, &params, draft(&format!("a{i}"), "pw"))
            .await
            .unwrap();
        placed.push(p);
    }
    // Eight cards fit comfortably; the sampler never needs its fallback.
    for (i, a) in placed.iter().enumerate() {
        for b in &placed[i + 1..] {
            assert!(a.distance(*b) >= params.min_distance);
        }
    }
}

#[tokio::test]
async fn create_card_rejects_invalid_draft_without_writing() {
    let store = MemoryCardStore::new();
    let err = create_card(&store, &SilhouetteProfile::tree(), &PlacementParams::default(), draft("", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, CardError::Validation(_)));
    assert!(store.list_cards().await.unwrap().is_empty());
}

#[tokio::test]
async fn verify_password_checks_hash() {
    let card = stored("a", 100.0, 150.0);
    let id = card.id;
    let store = MemoryCardStore::with_cards(vec![card]);
    assert!(verify_password(&store, id, "pw").await.unwrap());
    assert!(verify_password(&store, id, " pw ").await.unwrap());
    assert!(!verify_password(&store, id, "nope").await.unwrap());
    assert!(matches!(
        verify_password(&store, Uuid::new_v4(), "pw").await,
        Err(CardError::NotFound(_))
    ));
}

#[tokio::test]
async fn update_card_requires_password_and_keeps_position() {
    let card = stored("a", 90.0, 120.0);
    let id = card.id;
    let store = MemoryCardStore::with_cards(vec![card]);

    let err = update_card(&store, id, draft("b", "wrong")).await.unwrap_err();
    assert!(matches!(err, CardError::WrongPassword(missing) if missing == id));
    assert_eq!(store.get_card(id).await.unwrap().author_name, "a");

    update_card(&store, id, draft("b", "pw")).await.unwrap();
    let updated = store.get_card(id).await.unwrap();
    assert_eq!(updated.author_name, "b");
    assert_eq!(updated.position(), Point::new(90.0, 120.0));
    assert_eq!(updated.password_hash, hash_password("pw"));
}

#[tokio::test]
async fn delete_card_requires_password() {
    let card = stored("a", 100.0, 150.0);
    let id = card.id;
    let store = MemoryCardStore::with_cards(vec![card]);

    assert!(matches!(delete_card(&store, id, "wrong").await, Err(CardError::WrongPassword(_))));
    delete_card(&store, id, "pw").await.unwrap();
    assert!(matches!(delete_card(&store, id, "pw").await, Err(CardError::NotFound(_))));
}

#[tokio::test]
async fn move_card_unknown_is_not_found() {
    let store = MemoryCardStore::new();
    let err = move_card(&store, Uuid::new_v4(), Point::new(1.0, 2.0)).await.unwrap_err();
    assert!(matches!(err, CardError::NotFound(_)));
}

#[tokio::test]
async fn arrange_all_moves_every_card_apart() {
    let cards: Vec<Card> = (0..6).map(|i| stored(&format!("a{i}"), 100.0, 150.0)).collect();
    let store = MemoryCardStore::with_cards(cards);
    let params = PlacementParams::default();

    let placed = arrange_all(&store, &SilhouetteProfile::tree(), &params).await.unwrap();
    assert_eq!(placed.len(), 6);

    let stored = store.list_cards().await.unwrap();
    for (card, (id, point)) in stored.iter().zip(&placed) {
        assert_eq!(card.id, *id);
        assert_eq!(card.position(), *point);
    }
    for (i, (_, a)) in placed.iter().enumerate() {
        for (_, b) in &placed[i + 1..] {
            assert!(a.distance(*b) >= params.min_distance);
        }
    }
}

#[tokio::test]
async fn migrate_legacy_positions_rewrites_only_legacy() {
    let legacy_card = stored("old", 300.0, 400.0);
    let modern = stored("new", 80.0, 90.0);
    let (legacy_id, modern_id) = (legacy_card.id, modern.id);
    let store = MemoryCardStore::with_cards(vec![legacy_card, modern]);

    assert_eq!(migrate_legacy_positions(&store).await.unwrap(), 1);
    assert_eq!(store.get_card(legacy_id).await.unwrap().position(), Point::new(100.0, 142.5));
    assert_eq!(store.get_card(modern_id).await.unwrap().position(), Point::new(80.0, 90.0));

    assert_eq!(migrate_legacy_positions(&store).await.unwrap(), 0);
}
