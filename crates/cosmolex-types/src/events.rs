//! Change events delivered to progression listeners.
//!
//! Events are produced by the progression engine only after the state
//! change they describe has been durably recorded.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::MilestoneKind;
use crate::ids::{GalaxyKey, LessonKey, PlanetKey};
use crate::records::Badge;

/// A single observable progression change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ProgressEvent {
    /// The star total changed.
    StarsChanged {
        /// New total.
        total: u32,
        /// Signed change applied to the previous total.
        delta: i64,
    },
    /// The derived level increased. Emitted once per operation, carrying
    /// the final level even when several thresholds were crossed.
    LevelUp {
        /// Level reached.
        new_level: u32,
    },
    /// A planet became reachable.
    PlanetUnlocked {
        /// Canonical planet key.
        key: PlanetKey,
        /// Name shown to the learner.
        display_name: String,
    },
    /// A galaxy became reachable.
    GalaxyUnlocked {
        /// Canonical galaxy key.
        key: GalaxyKey,
    },
    /// A badge was awarded.
    BadgeEarned {
        /// The awarded badge.
        badge: Badge,
    },
    /// A counter crossed one of its milestone values.
    MilestoneReached {
        /// Counter family.
        kind: MilestoneKind,
        /// Milestone value crossed.
        value: u32,
    },
    /// A lesson became playable.
    LessonUnlocked {
        /// The lesson.
        lesson: LessonKey,
    },
    /// A lesson was completed for the first time.
    LessonCompleted {
        /// The lesson.
        lesson: LessonKey,
    },
    /// Every lesson of a planet is now completed.
    PlanetCompleted {
        /// The planet.
        planet: PlanetKey,
    },
}

impl ProgressEvent {
    /// Short machine-readable name of the event variant.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::StarsChanged { .. } => "stars_changed",
            Self::LevelUp { .. } => "level_up",
            Self::PlanetUnlocked { .. } => "planet_unlocked",
            Self::GalaxyUnlocked { .. } => "galaxy_unlocked",
            Self::BadgeEarned { .. } => "badge_earned",
            Self::MilestoneReached { .. } => "milestone_reached",
            Self::LessonUnlocked { .. } => "lesson_unlocked",
            Self::LessonCompleted { .. } => "lesson_completed",
            Self::PlanetCompleted { .. } => "planet_completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = ProgressEvent::PlanetUnlocked {
            key: PlanetKey::from("toytopia_orbit"),
            display_name: String::from("Toytopia Orbit"),
        };
        let value = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "planet_unlocked",
                "key": "toytopia_orbit",
                "display_name": "Toytopia Orbit",
            })
        );
    }

    #[test]
    fn kind_matches_serde_tag() {
        let event = ProgressEvent::LevelUp { new_level: 3 };
        let value = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(
            value.get("type").and_then(serde_json::Value::as_str),
            Some(event.kind())
        );
    }
}
