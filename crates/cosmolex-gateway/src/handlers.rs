//! REST API endpoint handlers for the gameplay gateway.
//!
//! Every handler forwards to the progression actor through the shared
//! [`AppState`]; none of them touch storage directly.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/progress` | Full progress snapshot |
//! | `GET` | `/api/lessons/{planet}/{scene}` | Gating state of one lesson |
//! | `POST` | `/api/lessons/complete` | Complete a lesson |
//! | `POST` | `/api/stars` | Earn stars |
//! | `POST` | `/api/words` | Count a learned word |
//! | `POST` | `/api/games` | Count a finished game |
//! | `POST` | `/api/logins` | Record a daily login |
//! | `POST` | `/api/unlocks/check` | Re-run the unlock rules |
//! | `GET` | `/api/sync` | Last sync status |
//! | `POST` | `/api/sync` | Request a sync round |
//! | `POST` | `/api/reset` | Clear local progress (if enabled) |
//!
//! `{planet}` in a path may be a canonical key or a legacy numeric id.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use chrono::NaiveDate;
use cosmolex_core::{Outcome, SyncRequest};
use cosmolex_types::{GameType, PlanetRef, ProgressEvent, SceneId, StarSource};

use crate::error::GatewayError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/lessons/complete`.
#[derive(Debug, serde::Deserialize)]
pub struct CompleteLessonRequest {
    /// Planet key or legacy numeric id.
    pub planet: PlanetRef,
    /// Scene number.
    pub scene: SceneId,
    /// Stars earned on the first completion.
    pub stars: u32,
}

/// Request body for `POST /api/stars`.
#[derive(Debug, serde::Deserialize)]
pub struct AddStarsRequest {
    /// Stars to add.
    pub amount: u32,
    /// Where they came from (default `bonus`).
    #[serde(default = "default_star_source")]
    pub source: StarSource,
}

const fn default_star_source() -> StarSource {
    StarSource::Bonus
}

/// Request body for `POST /api/games`.
#[derive(Debug, serde::Deserialize)]
pub struct GameCompletedRequest {
    /// The game family.
    pub game_type: GameType,
    /// Stars earned.
    pub stars: u32,
}

/// Request body for `POST /api/logins`.
#[derive(Debug, serde::Deserialize)]
pub struct LoginRequest {
    /// Calendar day of the login. Defaults to today on the server clock.
    pub date: Option<NaiveDate>,
}

/// Events produced by a state-changing call.
#[derive(Debug, serde::Serialize)]
struct EventsResponse {
    /// Emitted events, in order. Empty for a no-op.
    events: Vec<ProgressEvent>,
}

impl From<Outcome> for EventsResponse {
    fn from(outcome: Outcome) -> Self {
        Self {
            events: outcome.events,
        }
    }
}

/// Parse a `{planet}` path segment.
fn planet_ref(raw: &str) -> PlanetRef {
    raw.parse::<u32>()
        .map_or_else(|_| PlanetRef::from(raw), PlanetRef::Legacy)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Return the full progress snapshot.
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(state.progress.snapshot().await?))
}

/// Return the gating state of one lesson.
pub async fn get_lesson_state(
    State(state): State<Arc<AppState>>,
    Path((planet, scene)): Path<(String, SceneId)>,
) -> Result<impl IntoResponse, GatewayError> {
    let lesson_state = state
        .progress
        .lesson_state(planet_ref(&planet), scene)
        .await?;
    Ok(Json(serde_json::json!({
        "planet": planet,
        "scene": scene,
        "state": lesson_state,
    })))
}

/// Return the outcome of the most recent sync round.
pub async fn get_sync(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(state.progress.sync_status().await?))
}

// ---------------------------------------------------------------------------
// Gameplay
// ---------------------------------------------------------------------------

/// Complete a lesson.
pub async fn complete_lesson(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CompleteLessonRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let outcome = state
        .progress
        .complete_lesson(body.planet, body.scene, body.stars)
        .await?;
    Ok(Json(EventsResponse::from(outcome)))
}

/// Earn stars.
pub async fn add_stars(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddStarsRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let outcome = state.progress.add_stars(body.amount, body.source).await?;
    Ok(Json(EventsResponse::from(outcome)))
}

/// Count a learned word.
pub async fn record_word(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, GatewayError> {
    let outcome = state.progress.record_word_learned().await?;
    Ok(Json(EventsResponse::from(outcome)))
}

/// Count a finished game.
pub async fn record_game(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GameCompletedRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let outcome = state
        .progress
        .record_game_completed(body.game_type, body.stars)
        .await?;
    Ok(Json(EventsResponse::from(outcome)))
}

/// Record a daily login.
pub async fn record_login(
    State(state): State<Arc<AppState>>,
    body: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, GatewayError> {
    let today = body
        .and_then(|Json(body)| body.date)
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let outcome = state.progress.record_daily_login(today).await?;
    Ok(Json(EventsResponse::from(outcome)))
}

/// Re-run the unlock rules, e.g. after a catalog update.
pub async fn check_unlocks(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, GatewayError> {
    let outcome = state.progress.check_for_new_unlocks().await?;
    Ok(Json(EventsResponse::from(outcome)))
}

// ---------------------------------------------------------------------------
// Sync and maintenance
// ---------------------------------------------------------------------------

/// Start a sync round, or fold into the one in flight.
pub async fn request_sync(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, GatewayError> {
    let request = match state.progress.request_sync().await? {
        SyncRequest::Started => "started",
        SyncRequest::Coalesced => "coalesced",
    };
    Ok(Json(serde_json::json!({ "request": request })))
}

/// Clear all local progress and re-seed. Disabled unless
/// `gateway.allow_reset` is set.
pub async fn reset(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, GatewayError> {
    if !state.allow_reset {
        return Err(GatewayError::Forbidden(
            "reset is disabled on this gateway".to_owned(),
        ));
    }
    tracing::warn!("Resetting local progress on request");
    let outcome = state.progress.reset_for_testing().await?;
    Ok(Json(EventsResponse::from(outcome)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_planet_segment_is_a_legacy_id() {
        assert_eq!(planet_ref("2"), PlanetRef::Legacy(2));
        assert_eq!(planet_ref("toytopia_orbit"), PlanetRef::from("toytopia_orbit"));
    }
}
