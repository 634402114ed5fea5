//! Persisted and transmitted records.
//!
//! - [`LedgerRecord`] is the local ledger record (counters + streak).
//! - [`RemoteProgressDocument`] is the one-per-user backup document.
//! - [`ProgressSnapshot`] is the read model handed to the gameplay layer.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{GalaxyKey, InstallId, LessonKey, PlanetKey};

/// Consecutive-day login tracking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LoginStreak {
    /// Calendar day of the most recent recorded login.
    pub last_login: Option<NaiveDate>,
    /// Current run of consecutive days (0 before the first login).
    pub current: u32,
    /// Longest run ever reached.
    pub longest: u32,
}

/// Authoritative progression counters for one install.
///
/// The current level is deliberately absent: it is always derived from
/// `total_stars` and never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LedgerRecord {
    /// Stars earned (or adopted through a merge).
    pub total_stars: u32,
    /// Fuel cells collected, one per star earned.
    pub total_fuel_cells: u32,
    /// Crystals collected, one per ten-star boundary crossed while earning.
    pub total_crystals: u32,
    /// Words the learner has learned.
    pub words_learned: u32,
    /// Mini-games finished.
    pub games_completed: u32,
    /// Stars earned per planet.
    #[serde(default)]
    pub planet_stars: BTreeMap<PlanetKey, u32>,
    /// Daily login streak.
    #[serde(default)]
    pub login_streak: LoginStreak,
    /// Lessons whose first-completion reward has been paid. Kept in the
    /// same record as the star total so crediting and claiming are one
    /// write.
    #[serde(default)]
    pub claimed_rewards: BTreeSet<LessonKey>,
}

/// A badge awarded when every lesson of a planet is completed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Badge {
    /// Stable badge identifier (`badge:{planet}`).
    pub id: String,
    /// The planet the badge belongs to.
    pub planet: PlanetKey,
    /// Name shown to the learner.
    pub name: String,
}

impl Badge {
    /// Build the badge for a completed planet.
    pub fn for_planet(planet: &PlanetKey, name: impl Into<String>) -> Self {
        Self {
            id: format!("badge:{planet}"),
            planet: planet.clone(),
            name: name.into(),
        }
    }
}

/// The remote backup document, one per user.
///
/// Only stars and unlocked planets round-trip through the remote copy.
/// Field names follow the remote schema (`totalStars`, `unlockedPlanets`,
/// `updatedAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct RemoteProgressDocument {
    /// Star total at the time of the push.
    pub total_stars: u32,
    /// Planets unlocked at the time of the push.
    pub unlocked_planets: BTreeSet<PlanetKey>,
    /// When the document was written.
    pub updated_at: DateTime<Utc>,
}

/// Outcome of the most recent synchronisation attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "state", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SyncStatus {
    /// No sync has been attempted this session.
    #[default]
    NeverSynced,
    /// A fetch or push is currently outstanding.
    InFlight {
        /// When the request was started.
        since: DateTime<Utc>,
    },
    /// The last round trip succeeded.
    Synced {
        /// When the round trip finished.
        at: DateTime<Utc>,
        /// Whether merged state was pushed back.
        pushed: bool,
    },
    /// The remote store could not be reached; the engine keeps working
    /// offline and retries on the next state change.
    Failed {
        /// When the failure was observed.
        at: DateTime<Utc>,
        /// Human-readable reason.
        reason: String,
    },
}

/// Read model of the whole progression state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ProgressSnapshot {
    /// The install this state belongs to.
    pub install: InstallId,
    /// Current level, derived from `ledger.total_stars`.
    pub level: u32,
    /// Ledger counters.
    pub ledger: LedgerRecord,
    /// Lessons that are playable.
    pub unlocked_lessons: BTreeSet<LessonKey>,
    /// Lessons finished at least once.
    pub completed_lessons: BTreeSet<LessonKey>,
    /// Planets reachable by the learner.
    pub unlocked_planets: BTreeSet<PlanetKey>,
    /// Galaxies reachable by the learner.
    pub unlocked_galaxies: BTreeSet<GalaxyKey>,
    /// Badges earned so far.
    pub badges: BTreeSet<Badge>,
    /// Last sync outcome.
    pub sync: SyncStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_document_uses_camel_case_wire_names() {
        let doc = RemoteProgressDocument {
            total_stars: 55,
            unlocked_planets: BTreeSet::from([PlanetKey::from("coloria_prime")]),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&doc).unwrap_or_default();
        assert_eq!(value.get("totalStars"), Some(&serde_json::json!(55)));
        assert_eq!(
            value.get("unlockedPlanets"),
            Some(&serde_json::json!(["coloria_prime"]))
        );
        assert!(value.get("updatedAt").is_some());
    }

    #[test]
    fn ledger_record_tolerates_missing_optional_sections() {
        let json = r#"{
            "total_stars": 12,
            "total_fuel_cells": 12,
            "total_crystals": 1,
            "words_learned": 4,
            "games_completed": 2
        }"#;
        let record: Result<LedgerRecord, _> = serde_json::from_str(json);
        assert!(record.is_ok());
        let record = record.unwrap_or_default();
        assert_eq!(record.total_stars, 12);
        assert!(record.planet_stars.is_empty());
        assert_eq!(record.login_streak, LoginStreak::default());
    }

    #[test]
    fn badge_id_is_derived_from_planet() {
        let badge = Badge::for_planet(&PlanetKey::from("toytopia_orbit"), "Toy Tinkerer");
        assert_eq!(badge.id, "badge:toytopia_orbit");
    }

    #[test]
    fn sync_status_is_tagged() {
        let value = serde_json::to_value(SyncStatus::NeverSynced).unwrap_or_default();
        assert_eq!(value, serde_json::json!({"state": "never_synced"}));
    }
}
