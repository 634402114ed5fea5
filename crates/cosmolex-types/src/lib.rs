//! Shared type definitions for the Cosmolex progression engine.
//!
//! This crate is the single source of truth for keys, events and records
//! used across the workspace. UI-facing types flow downstream to
//! `TypeScript` via `ts-rs` for the game client.
//!
//! # Modules
//!
//! - [`ids`] -- Catalog keys, lesson addresses and the install identifier
//! - [`enums`] -- Lesson states, star sources, game types, milestone kinds
//! - [`events`] -- [`ProgressEvent`] delivered to listeners
//! - [`records`] -- Ledger record, remote document, snapshot and sync status

pub mod enums;
pub mod events;
pub mod ids;
pub mod records;

// Re-export all public types at crate root for convenience.
pub use enums::{GameType, LessonState, MilestoneKind, StarSource};
pub use events::ProgressEvent;
pub use ids::{GalaxyKey, InstallId, LessonKey, PlanetKey, PlanetRef, SceneId};
pub use records::{
    Badge, LedgerRecord, LoginStreak, ProgressSnapshot, RemoteProgressDocument, SyncStatus,
};
