//! Gameplay gateway for the Cosmolex progression engine.
//!
//! An Axum server that exposes the progression actor to the game client:
//!
//! - **REST endpoints** under `/api` for gameplay calls, lesson gating
//!   queries, snapshots and sync control
//! - **`WebSocket` endpoint** (`/ws/events`) opening with a snapshot and
//!   then streaming each
//!   [`ProgressEvent`](cosmolex_types::ProgressEvent) as JSON via
//!   [`tokio::sync::broadcast`], optionally filtered by kind
//!
//! Handlers never touch storage; every call goes through the
//! [`ProgressionHandle`](cosmolex_core::ProgressionHandle) in [`AppState`],
//! so HTTP requests are serialized with sync results and timer ticks.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use error::GatewayError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::{AppState, BroadcastListener};
