//! Unlock rules, progression service and sync reconciliation for Cosmolex.
//!
//! [`ProgressionEngine`] composes the content catalog, the persisted
//! [`cosmolex_store::UnlockStore`] and the
//! [`cosmolex_ledger::ProgressionLedger`]. Every state-changing operation
//! writes through to local storage before returning and reports what
//! happened as an [`Outcome`] of [`cosmolex_types::ProgressEvent`]s, which
//! are also delivered to registered listeners.
//!
//! # Modules
//!
//! - [`engine`] -- [`ProgressionEngine`], seeding, remote merge and reset.
//! - [`actor`] -- [`ProgressionActor`], the single owner of an engine, and
//!   its cloneable [`ProgressionHandle`].
//! - [`sync`] -- [`SyncReconciler`] and the remote merge plan.
//! - [`listener`] -- [`ProgressListener`] hooks and the registry.
//! - [`config`] -- Configuration loading from `cosmolex-config.yaml`.
//! - [`error`] -- [`ProgressError`].
//!
//! Gameplay operations (`complete_lesson`, `add_stars`, ...) and the unlock
//! rules live in private modules as further `impl ProgressionEngine` blocks.

pub mod actor;
pub mod config;
pub mod engine;
pub mod error;
mod gameplay;
pub mod listener;
pub mod sync;
mod unlock;

pub use actor::{ActorError, ActorSettings, ProgressionActor, ProgressionHandle, SyncRequest};
pub use config::{ConfigError, ProgressConfig};
pub use engine::{CatalogMode, MergeOutcome, Outcome, ProgressionEngine};
pub use error::ProgressError;
pub use listener::{EventLog, ListenerRegistry, ProgressListener};
pub use sync::SyncReconciler;
