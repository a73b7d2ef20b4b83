//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the card REST API, sticker processing, and the
//! spreadsheet-compatible `/exec` action endpoint under a single Axum
//! router. The browser frontend is served as static files from
//! `STATIC_DIR` when one is configured.

pub mod cards;
pub mod exec;
pub mod stickers;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// API routes shared by the browser frontend and script clients.
fn api_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let upload_limit = DefaultBodyLimit::max(state.config.sticker.max_upload_bytes);
    let card_limit = DefaultBodyLimit::max(state.config.card_max_body_bytes);

    Router::new()
        .route(
            "/api/cards",
            get(cards::list_cards)
                .post(cards::create_card)
                .layer(card_limit),
        )
        .route("/api/cards/arrange", post(cards::arrange_cards))
        .route(
            "/api/cards/{id}",
            get(cards::get_card)
                .put(cards::update_card)
                .delete(cards::delete_card)
                .layer(card_limit),
        )
        .route("/api/cards/{id}/page", get(cards::card_page))
        .route("/api/cards/{id}/position", patch(cards::move_card))
        .route("/api/cards/{id}/verify", post(cards::verify_password))
        .route("/api/stickers", post(stickers::upload_sticker).layer(upload_limit))
        .route("/api/stickers/defaults", get(stickers::default_stickers))
        .route("/exec", get(exec::exec_get).post(exec::exec_post).layer(card_limit))
        .route("/healthz", get(healthz))
        .layer(cors)
        .with_state(state)
}

/// Full application router: API routes, then static assets as the fallback.
pub fn app(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();
    let router = api_routes(state);
    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true)),
        None => router,
    };
    router
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
