//! `WebSocket` stream of progress events.
//!
//! `GET /ws/events` opens with a `snapshot` frame carrying the full
//! [`ProgressSnapshot`], followed by one `event` frame per
//! [`ProgressEvent`] in emission order. `?kinds=planet_unlocked,level_up`
//! restricts the stream to the listed event kinds.
//!
//! A client that falls more than the channel capacity behind is sent a
//! fresh `snapshot` frame instead of the events it missed, so its view
//! never silently diverges from the engine.

use std::collections::BTreeSet;
use std::ops::ControlFlow;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use cosmolex_types::{ProgressEvent, ProgressSnapshot};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Query parameters of `GET /ws/events`.
#[derive(Debug, Default, Deserialize)]
pub struct EventStreamParams {
    /// Comma-separated event kinds to forward. Absent means all.
    pub kinds: Option<String>,
}

/// Which event kinds a client asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct KindFilter(BTreeSet<String>);

impl KindFilter {
    fn parse(raw: Option<&str>) -> Self {
        Self(
            raw.unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|kind| !kind.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }

    fn admits(&self, event: &ProgressEvent) -> bool {
        self.0.is_empty() || self.0.contains(event.kind())
    }
}

/// One text frame on the stream.
#[derive(Debug, Serialize)]
#[serde(tag = "frame", rename_all = "snake_case")]
enum Frame<'a> {
    Snapshot { snapshot: &'a ProgressSnapshot },
    Event { event: &'a ProgressEvent },
}

/// Upgrade to a `WebSocket` and stream progress to the client.
///
/// # Route
///
/// `GET /ws/events`
pub async fn ws_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventStreamParams>,
) -> impl IntoResponse {
    let filter = KindFilter::parse(params.kinds.as_deref());
    ws.on_upgrade(move |socket| stream_progress(socket, state, filter))
}

async fn stream_progress(mut socket: WebSocket, state: Arc<AppState>, filter: KindFilter) {
    // Subscribe first: an event racing the snapshot is sent twice rather
    // than lost.
    let mut rx = state.subscribe();
    debug!(kinds = ?filter.0, "Progress stream opened");

    if send_snapshot(&mut socket, &state).await.is_break() {
        return;
    }

    loop {
        let flow = tokio::select! {
            received = rx.recv() => match received {
                Ok(event) if filter.admits(&event) => {
                    send_frame(&mut socket, &Frame::Event { event: &event }).await
                }
                Ok(_) => ControlFlow::Continue(()),
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Progress stream lagged, resending snapshot");
                    send_snapshot(&mut socket, &state).await
                }
                Err(RecvError::Closed) => ControlFlow::Break(()),
            },
            incoming = socket.recv() => on_client_message(&mut socket, incoming).await,
        };
        if flow.is_break() {
            break;
        }
    }
    debug!("Progress stream closed");
}

async fn send_snapshot(socket: &mut WebSocket, state: &AppState) -> ControlFlow<()> {
    match state.progress.snapshot().await {
        Ok(snapshot) => send_frame(socket, &Frame::Snapshot { snapshot: &snapshot }).await,
        Err(e) => {
            warn!(error = %e, "Snapshot unavailable, closing progress stream");
            ControlFlow::Break(())
        }
    }
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame<'_>) -> ControlFlow<()> {
    let json = match serde_json::to_string(frame) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "Could not encode progress frame");
            return ControlFlow::Continue(());
        }
    };
    if socket.send(Message::Text(json.into())).await.is_err() {
        return ControlFlow::Break(());
    }
    ControlFlow::Continue(())
}

/// Clients only listen; anything but a ping or a close is ignored.
async fn on_client_message(
    socket: &mut WebSocket,
    incoming: Option<Result<Message, axum::Error>>,
) -> ControlFlow<()> {
    match incoming {
        Some(Ok(Message::Ping(data))) => {
            if socket.send(Message::Pong(data)).await.is_err() {
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        }
        Some(Ok(Message::Close(_))) | None => ControlFlow::Break(()),
        Some(Err(e)) => {
            debug!(error = %e, "Progress stream receive error");
            ControlFlow::Break(())
        }
        Some(Ok(_)) => ControlFlow::Continue(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cosmolex_types::PlanetKey;

    use super::*;

    fn planet_unlocked() -> ProgressEvent {
        ProgressEvent::PlanetUnlocked {
            key: PlanetKey::from("toytopia_orbit"),
            display_name: "Toytopia Orbit".to_owned(),
        }
    }

    #[test]
    fn empty_filter_admits_everything() {
        let filter = KindFilter::parse(None);
        assert!(filter.admits(&planet_unlocked()));
        assert!(filter.admits(&ProgressEvent::LevelUp { new_level: 2 }));
        assert_eq!(KindFilter::parse(Some(" , ")), filter);
    }

    #[test]
    fn filter_admits_listed_kinds_only() {
        let filter = KindFilter::parse(Some("planet_unlocked, badge_earned"));
        assert!(filter.admits(&planet_unlocked()));
        assert!(!filter.admits(&ProgressEvent::LevelUp { new_level: 2 }));
    }

    #[test]
    fn event_frame_wraps_the_event() {
        let event = planet_unlocked();
        let json = serde_json::to_value(Frame::Event { event: &event }).unwrap();
        assert_eq!(json["frame"], "event");
        assert_eq!(json["event"]["type"], "planet_unlocked");
        assert_eq!(json["event"]["key"], "toytopia_orbit");
    }
}
