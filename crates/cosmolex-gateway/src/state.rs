//! Shared application state for the gameplay gateway.
//!
//! [`AppState`] holds the [`ProgressionHandle`] every handler talks to and
//! the broadcast channel feeding `WebSocket` clients. The channel is filled
//! by a [`BroadcastListener`] registered on the engine, so clients see the
//! same events, in the same order, as any in-process listener.

use cosmolex_core::{ProgressListener, ProgressionHandle};
use cosmolex_types::ProgressEvent;
use tokio::sync::broadcast;

/// Capacity of the broadcast channel for progress events.
///
/// A subscriber that falls behind by more than this many events receives
/// a [`broadcast::error::RecvError::Lagged`] and skips ahead.
const BROADCAST_CAPACITY: usize = 256;

/// Shared state for the Axum application.
#[derive(Clone)]
pub struct AppState {
    /// Client of the progression actor.
    pub progress: ProgressionHandle,
    /// Broadcast sender for progress events.
    pub tx: broadcast::Sender<ProgressEvent>,
    /// Whether `POST /api/reset` is enabled.
    pub allow_reset: bool,
}

impl AppState {
    /// Create the state around a running actor.
    pub fn new(progress: ProgressionHandle, allow_reset: bool) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            progress,
            tx,
            allow_reset,
        }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.tx.subscribe()
    }

    /// A listener that forwards engine events into this state's channel.
    pub fn listener(&self) -> BroadcastListener {
        BroadcastListener {
            tx: self.tx.clone(),
        }
    }
}

/// [`ProgressListener`] that republishes every event on a broadcast
/// channel.
#[derive(Debug, Clone)]
pub struct BroadcastListener {
    tx: broadcast::Sender<ProgressEvent>,
}

impl ProgressListener for BroadcastListener {
    fn on_event(&self, event: &ProgressEvent) {
        // Err only means nobody is subscribed right now.
        let _ = self.tx.send(event.clone());
    }
}
