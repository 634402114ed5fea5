//! Content descriptors: galaxies, planets and their lessons.
//!
//! These mirror the YAML catalog format one-to-one.

use cosmolex_types::{GalaxyKey, LessonKey, PlanetKey, SceneId};
use serde::{Deserialize, Serialize};

/// A top-level grouping of planets, gated by a star threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalaxyDef {
    /// Canonical galaxy key.
    pub key: GalaxyKey,
    /// Name shown to the learner.
    pub display_name: String,
    /// Position among galaxies (1-based).
    pub order_index: u32,
    /// Stars required to unlock the galaxy.
    #[serde(default)]
    pub star_threshold: u32,
}

/// A thematic content unit holding an ordered lesson sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanetDef {
    /// Canonical planet key.
    pub key: PlanetKey,
    /// Numeric id used by older clients, if any.
    #[serde(default)]
    pub legacy_id: Option<u32>,
    /// Name shown to the learner.
    pub display_name: String,
    /// The galaxy this planet belongs to.
    pub galaxy: GalaxyKey,
    /// Position within its galaxy (1-based).
    pub order_index: u32,
    /// Stars required to unlock the planet.
    #[serde(default)]
    pub star_threshold: u32,
    /// Name of the badge awarded on planet completion.
    pub badge_name: String,
    /// Lessons, in any order; the builder sorts them by `order_index`.
    pub lessons: Vec<LessonDef>,
}

impl PlanetDef {
    /// Key of the lesson with the given scene id on this planet.
    pub fn lesson_key(&self, scene: SceneId) -> LessonKey {
        LessonKey::new(self.key.clone(), scene)
    }
}

/// The smallest playable unit inside a planet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonDef {
    /// Scene id, unique within the planet.
    pub scene: SceneId,
    /// Position within the planet (1-based, contiguous).
    pub order_index: u32,
    /// Lesson title.
    pub title: String,
}
