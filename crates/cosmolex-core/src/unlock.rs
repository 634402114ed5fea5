//! Unlock rules.
//!
//! - Lessons: the first lesson of an unlocked planet is unlocked; every
//!   later lesson unlocks once its predecessor is completed.
//! - Planets: unlocked when `total_stars >= star_threshold`.
//! - Galaxies: unlocked when `total_stars >= star_threshold`, regardless
//!   of planet completion in earlier galaxies.
//!
//! Unlocking is monotonic; nothing here ever removes from a set.

use std::sync::Arc;

use cosmolex_catalog::PlanetDef;
use cosmolex_types::{GalaxyKey, LessonKey, LessonState, PlanetRef, ProgressEvent, SceneId};

use crate::engine::{ChangeOrigin, Outcome, ProgressionEngine};
use crate::error::ProgressError;

impl ProgressionEngine {
    /// Re-evaluate every galaxy and planet against the current star total
    /// and walk the lesson chain of every unlocked planet.
    ///
    /// Idempotent; safe to call after any star award or merge.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::Persistence`] if an unlock could not be
    /// written.
    pub fn check_for_new_unlocks(&mut self) -> Result<Outcome, ProgressError> {
        self.run(ChangeOrigin::Local, Self::apply_unlock_rules)
    }

    pub(crate) fn apply_unlock_rules(
        &mut self,
        events: &mut Vec<ProgressEvent>,
    ) -> Result<(), ProgressError> {
        let catalog = Arc::clone(&self.catalog);
        let stars = self.ledger.total_stars();

        for galaxy in catalog.galaxies() {
            if stars >= galaxy.star_threshold && self.unlocks.unlock_galaxy(&galaxy.key)? {
                tracing::info!(
                    galaxy = %galaxy.key,
                    threshold = galaxy.star_threshold,
                    stars,
                    "Galaxy unlocked"
                );
                events.push(ProgressEvent::GalaxyUnlocked {
                    key: galaxy.key.clone(),
                });
            }
        }

        for planet in catalog.planets() {
            if stars >= planet.star_threshold {
                self.unlock_planet(planet, events)?;
            }
        }

        // Cascade: covers planets unlocked above and planets adopted by a
        // merge without their lessons having been walked.
        for planet in catalog.planets() {
            if self.unlocks.is_planet_unlocked(&planet.key) {
                self.walk_lesson_chain(planet, events)?;
            }
        }
        Ok(())
    }

    pub(crate) fn unlock_planet(
        &mut self,
        planet: &PlanetDef,
        events: &mut Vec<ProgressEvent>,
    ) -> Result<(), ProgressError> {
        if self.unlocks.unlock_planet(&planet.key)? {
            tracing::info!(
                planet = %planet.key,
                threshold = planet.star_threshold,
                stars = self.ledger.total_stars(),
                "Planet unlocked"
            );
            events.push(ProgressEvent::PlanetUnlocked {
                key: planet.key.clone(),
                display_name: planet.display_name.clone(),
            });
        }
        Ok(())
    }

    /// Unlock lessons in order up to and including the first one that is
    /// not yet completed.
    fn walk_lesson_chain(
        &mut self,
        planet: &PlanetDef,
        events: &mut Vec<ProgressEvent>,
    ) -> Result<(), ProgressError> {
        for lesson in &planet.lessons {
            let key = planet.lesson_key(lesson.scene);
            if self.unlocks.unlock_lesson(&key)? {
                tracing::debug!(lesson = %key, "Lesson unlocked");
                events.push(ProgressEvent::LessonUnlocked {
                    lesson: key.clone(),
                });
            }
            if !self.unlocks.is_lesson_completed(&key) {
                break;
            }
        }
        Ok(())
    }

    /// Whether every lesson of `planet` is completed.
    pub(crate) fn is_planet_completed(&self, planet: &PlanetDef) -> bool {
        planet
            .lessons
            .iter()
            .all(|l| self.unlocks.is_lesson_completed(&planet.lesson_key(l.scene)))
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Gating state of a lesson.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::NotFound`] in strict mode when the planet
    /// or lesson is not in the catalog. In lenient mode it reports
    /// [`LessonState::Locked`].
    pub fn lesson_state(
        &self,
        planet: &PlanetRef,
        scene: SceneId,
    ) -> Result<LessonState, ProgressError> {
        let Some(key) = self.catalog.resolve_planet(planet) else {
            self.missing("planet", planet.to_string())?;
            return Ok(LessonState::Locked);
        };
        let lesson = LessonKey::new(key, scene);
        if self.catalog.lesson(&lesson).is_none() {
            self.missing("lesson", lesson.to_string())?;
            return Ok(LessonState::Locked);
        }

        Ok(if self.unlocks.is_lesson_completed(&lesson) {
            LessonState::Completed
        } else if self.unlocks.is_lesson_unlocked(&lesson) {
            LessonState::Unlocked
        } else {
            LessonState::Locked
        })
    }

    /// Whether a planet is unlocked. Unknown references are locked, except
    /// canonical keys adopted from a remote document.
    pub fn is_planet_unlocked(&self, planet: &PlanetRef) -> bool {
        match self.catalog.resolve_planet(planet) {
            Some(key) => self.unlocks.is_planet_unlocked(&key),
            None => match planet {
                PlanetRef::Key(key) => self.unlocks.is_planet_unlocked(key),
                PlanetRef::Legacy(_) => false,
            },
        }
    }

    /// Whether a galaxy is unlocked.
    pub fn is_galaxy_unlocked(&self, galaxy: &GalaxyKey) -> bool {
        self.unlocks.is_galaxy_unlocked(galaxy)
    }
}
