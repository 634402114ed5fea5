//! Progression ledger for the Cosmolex progression engine.
//!
//! The ledger holds the authoritative learner counters: stars, fuel cells,
//! crystals, words learned, games completed, per-planet stars and the
//! daily login streak. It is pure in-memory logic; persistence is handled
//! by `cosmolex-store` and orchestration by `cosmolex-core`.
//!
//! # Modules
//!
//! - [`ledger`] -- [`ProgressionLedger`] and the [`LedgerChange`] it reports.
//! - [`level`] -- Level derivation from the star total.
//! - [`milestones`] -- Milestone tables and crossing detection.
//! - [`streak`] -- Daily login streak rules.
//!
//! # Level rule
//!
//! ```text
//! level = total_stars / 50 + 1
//! ```
//!
//! The level is recomputed on every read and can only be changed by
//! changing the star total.
//!
//! # Usage
//!
//! ```
//! use cosmolex_ledger::ProgressionLedger;
//!
//! let mut ledger = ProgressionLedger::new();
//! let change = ledger.add_stars(120);
//! assert_eq!(change.level_up(), Some(3));
//!
//! // Adopting a lower remote total is a no-op.
//! let merged = ledger.merge_total_stars(90);
//! assert!(!merged.stars_changed());
//! assert_eq!(ledger.total_stars(), 120);
//! ```

pub mod ledger;
pub mod level;
pub mod milestones;
pub mod streak;

// Re-export primary types at crate root.
pub use ledger::{LedgerChange, LoginOutcome, ProgressionLedger, STARS_PER_CRYSTAL};
pub use level::{STARS_PER_LEVEL, level_for_stars, stars_to_next_level};
pub use milestones::Milestone;
pub use streak::StreakAdvance;
