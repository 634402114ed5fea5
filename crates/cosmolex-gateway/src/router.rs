//! Axum router construction for the gameplay gateway.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete router: REST endpoints under `/api` (see
/// [`handlers`]) and the event stream at `GET /ws/events`.
///
/// CORS allows any origin so a locally served game client can call in.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // WebSocket
        .route("/ws/events", get(ws::ws_events))
        // Reads
        .route("/api/progress", get(handlers::get_progress))
        .route("/api/lessons/{planet}/{scene}", get(handlers::get_lesson_state))
        // Gameplay
        .route("/api/lessons/complete", post(handlers::complete_lesson))
        .route("/api/stars", post(handlers::add_stars))
        .route("/api/words", post(handlers::record_word))
        .route("/api/games", post(handlers::record_game))
        .route("/api/logins", post(handlers::record_login))
        .route("/api/unlocks/check", post(handlers::check_unlocks))
        // Sync and maintenance
        .route(
            "/api/sync",
            get(handlers::get_sync).post(handlers::request_sync),
        )
        .route("/api/reset", post(handlers::reset))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
