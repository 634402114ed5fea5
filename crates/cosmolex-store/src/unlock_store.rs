//! Persisted, idempotent unlock membership sets.
//!
//! Every mutator is write-through: the updated set is durably written
//! before the in-memory copy changes, so a failed write leaves the store
//! exactly as it was and the caller sees [`StoreError`].

use std::collections::BTreeSet;
use std::sync::Arc;

use cosmolex_types::{Badge, GalaxyKey, InstallId, LessonKey, PlanetKey};

use crate::error::StoreError;
use crate::keys::{SetKind, set_key};
use crate::kv::KeyValueStore;
use crate::record::{self, Record};

/// Read a set, treating a missing key as empty.
fn load_set<T>(kv: &dyn KeyValueStore, key: &str) -> Result<BTreeSet<T>, StoreError>
where
    BTreeSet<T>: Record,
{
    kv.get(key)?
        .map_or_else(|| Ok(BTreeSet::new()), |raw| record::decode(key, &raw))
}

/// Insert `value`, persisting the whole set before committing it.
fn insert_persisted<T>(
    kv: &dyn KeyValueStore,
    key: &str,
    set: &mut BTreeSet<T>,
    value: T,
) -> Result<bool, StoreError>
where
    T: Ord + Clone,
    BTreeSet<T>: Record,
{
    if set.contains(&value) {
        return Ok(false);
    }
    let mut next = set.clone();
    next.insert(value);
    kv.put(key, &record::encode(&next)?)?;
    *set = next;
    Ok(true)
}

/// The four unlock sets plus badges for one install.
pub struct UnlockStore {
    kv: Arc<dyn KeyValueStore>,
    install: InstallId,
    unlocked_lessons: BTreeSet<LessonKey>,
    completed_lessons: BTreeSet<LessonKey>,
    unlocked_planets: BTreeSet<PlanetKey>,
    unlocked_galaxies: BTreeSet<GalaxyKey>,
    badges: BTreeSet<Badge>,
}

impl core::fmt::Debug for UnlockStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UnlockStore")
            .field("install", &self.install)
            .field("unlocked_lessons", &self.unlocked_lessons.len())
            .field("completed_lessons", &self.completed_lessons.len())
            .field("unlocked_planets", &self.unlocked_planets.len())
            .field("unlocked_galaxies", &self.unlocked_galaxies.len())
            .finish_non_exhaustive()
    }
}

impl UnlockStore {
    /// Load every set for `install`. Absent keys load as empty sets.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a stored set cannot be read or decoded.
    pub fn open(kv: Arc<dyn KeyValueStore>, install: InstallId) -> Result<Self, StoreError> {
        let key = |kind| set_key(install, kind);
        let store = Self {
            unlocked_lessons: load_set(kv.as_ref(), &key(SetKind::UnlockedLessons))?,
            completed_lessons: load_set(kv.as_ref(), &key(SetKind::CompletedLessons))?,
            unlocked_planets: load_set(kv.as_ref(), &key(SetKind::UnlockedPlanets))?,
            unlocked_galaxies: load_set(kv.as_ref(), &key(SetKind::UnlockedGalaxies))?,
            badges: load_set(kv.as_ref(), &key(SetKind::Badges))?,
            kv,
            install,
        };
        tracing::debug!(
            install = %install,
            lessons = store.unlocked_lessons.len(),
            planets = store.unlocked_planets.len(),
            "Loaded unlock store"
        );
        Ok(store)
    }

    /// The install these sets belong to.
    pub const fn install(&self) -> InstallId {
        self.install
    }

    /// Whether nothing at all has been unlocked yet (first run).
    pub fn is_empty(&self) -> bool {
        self.unlocked_lessons.is_empty()
            && self.unlocked_planets.is_empty()
            && self.unlocked_galaxies.is_empty()
    }

    fn key(&self, kind: SetKind) -> String {
        set_key(self.install, kind)
    }

    // -------------------------------------------------------------------------
    // Lessons
    // -------------------------------------------------------------------------

    /// Whether `lesson` is unlocked.
    pub fn is_lesson_unlocked(&self, lesson: &LessonKey) -> bool {
        self.unlocked_lessons.contains(lesson)
    }

    /// Whether `lesson` has been completed.
    pub fn is_lesson_completed(&self, lesson: &LessonKey) -> bool {
        self.completed_lessons.contains(lesson)
    }

    /// Unlock `lesson`. Returns whether the set changed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write did not become durable.
    pub fn unlock_lesson(&mut self, lesson: &LessonKey) -> Result<bool, StoreError> {
        let key = self.key(SetKind::UnlockedLessons);
        insert_persisted(
            self.kv.as_ref(),
            &key,
            &mut self.unlocked_lessons,
            lesson.clone(),
        )
    }

    /// Mark `lesson` completed. Returns whether the set changed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write did not become durable.
    pub fn mark_lesson_completed(&mut self, lesson: &LessonKey) -> Result<bool, StoreError> {
        let key = self.key(SetKind::CompletedLessons);
        insert_persisted(
            self.kv.as_ref(),
            &key,
            &mut self.completed_lessons,
            lesson.clone(),
        )
    }

    // -------------------------------------------------------------------------
    // Planets and galaxies
    // -------------------------------------------------------------------------

    /// Whether `planet` is unlocked.
    pub fn is_planet_unlocked(&self, planet: &PlanetKey) -> bool {
        self.unlocked_planets.contains(planet)
    }

    /// Unlock `planet`. Returns whether the set changed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write did not become durable.
    pub fn unlock_planet(&mut self, planet: &PlanetKey) -> Result<bool, StoreError> {
        let key = self.key(SetKind::UnlockedPlanets);
        insert_persisted(
            self.kv.as_ref(),
            &key,
            &mut self.unlocked_planets,
            planet.clone(),
        )
    }

    /// Union `remote` into the unlocked planets with a single write.
    ///
    /// Returns the planets that were newly added, in key order. Existing
    /// local unlocks are never removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write did not become durable.
    pub fn merge_unlocked_planets(
        &mut self,
        remote: &BTreeSet<PlanetKey>,
    ) -> Result<Vec<PlanetKey>, StoreError> {
        let added: Vec<PlanetKey> = remote
            .difference(&self.unlocked_planets)
            .cloned()
            .collect();
        if added.is_empty() {
            return Ok(added);
        }

        let mut next = self.unlocked_planets.clone();
        next.extend(added.iter().cloned());
        self.kv
            .put(&self.key(SetKind::UnlockedPlanets), &record::encode(&next)?)?;
        self.unlocked_planets = next;
        Ok(added)
    }

    /// Whether `galaxy` is unlocked.
    pub fn is_galaxy_unlocked(&self, galaxy: &GalaxyKey) -> bool {
        self.unlocked_galaxies.contains(galaxy)
    }

    /// Unlock `galaxy`. Returns whether the set changed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write did not become durable.
    pub fn unlock_galaxy(&mut self, galaxy: &GalaxyKey) -> Result<bool, StoreError> {
        let key = self.key(SetKind::UnlockedGalaxies);
        insert_persisted(
            self.kv.as_ref(),
            &key,
            &mut self.unlocked_galaxies,
            galaxy.clone(),
        )
    }

    // -------------------------------------------------------------------------
    // Badges
    // -------------------------------------------------------------------------

    /// Whether a badge with `badge_id` has been awarded.
    pub fn has_badge(&self, badge_id: &str) -> bool {
        self.badges.iter().any(|b| b.id == badge_id)
    }

    /// Award `badge`. Returns `false` if a badge with the same id exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write did not become durable.
    pub fn award_badge(&mut self, badge: Badge) -> Result<bool, StoreError> {
        if self.has_badge(&badge.id) {
            return Ok(false);
        }
        let key = self.key(SetKind::Badges);
        insert_persisted(self.kv.as_ref(), &key, &mut self.badges, badge)
    }

    // -------------------------------------------------------------------------
    // Read access
    // -------------------------------------------------------------------------

    /// Unlocked lessons.
    pub const fn unlocked_lessons(&self) -> &BTreeSet<LessonKey> {
        &self.unlocked_lessons
    }

    /// Completed lessons.
    pub const fn completed_lessons(&self) -> &BTreeSet<LessonKey> {
        &self.completed_lessons
    }

    /// Unlocked planets.
    pub const fn unlocked_planets(&self) -> &BTreeSet<PlanetKey> {
        &self.unlocked_planets
    }

    /// Unlocked galaxies.
    pub const fn unlocked_galaxies(&self) -> &BTreeSet<GalaxyKey> {
        &self.unlocked_galaxies
    }

    /// Awarded badges.
    pub const fn badges(&self) -> &BTreeSet<Badge> {
        &self.badges
    }

    /// Remove every set for this install from storage and memory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a removal fails. Sets removed before the
    /// failure are already cleared.
    pub fn reset_for_testing(&mut self) -> Result<(), StoreError> {
        for kind in SetKind::ALL {
            self.kv.remove(&self.key(kind))?;
            match kind {
                SetKind::UnlockedLessons => self.unlocked_lessons.clear(),
                SetKind::CompletedLessons => self.completed_lessons.clear(),
                SetKind::UnlockedPlanets => self.unlocked_planets.clear(),
                SetKind::UnlockedGalaxies => self.unlocked_galaxies.clear(),
                SetKind::Badges => self.badges.clear(),
            }
        }
        tracing::info!(install = %self.install, "Unlock store reset");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kv::{FileKvStore, MemoryKvStore};

    fn memory_store() -> (Arc<MemoryKvStore>, UnlockStore) {
        let kv = Arc::new(MemoryKvStore::new());
        let store = UnlockStore::open(kv.clone(), InstallId::new()).unwrap();
        (kv, store)
    }

    #[test]
    fn unlock_is_idempotent() {
        let (_kv, mut store) = memory_store();
        let lesson = LessonKey::new("coloria_prime", 1);
        assert!(store.unlock_lesson(&lesson).unwrap());
        assert!(!store.unlock_lesson(&lesson).unwrap());
        assert!(store.is_lesson_unlocked(&lesson));
        assert_eq!(store.unlocked_lessons().len(), 1);
    }

    #[test]
    fn failed_write_leaves_state_untouched() {
        let (kv, mut store) = memory_store();
        kv.reject_writes(true);
        let planet = PlanetKey::from("toytopia_orbit");
        assert!(store.unlock_planet(&planet).is_err());
        assert!(!store.is_planet_unlocked(&planet));

        kv.reject_writes(false);
        assert!(store.unlock_planet(&planet).unwrap());
    }

    #[test]
    fn merge_is_a_union() {
        let (_kv, mut store) = memory_store();
        store.unlock_planet(&PlanetKey::from("coloria_prime")).unwrap();
        store.unlock_planet(&PlanetKey::from("toytopia_orbit")).unwrap();

        let remote = BTreeSet::from([
            PlanetKey::from("coloria_prime"),
            PlanetKey::from("animania_wild"),
        ]);
        let added = store.merge_unlocked_planets(&remote).unwrap();
        assert_eq!(added, vec![PlanetKey::from("animania_wild")]);
        assert_eq!(store.unlocked_planets().len(), 3);

        assert!(store.merge_unlocked_planets(&remote).unwrap().is_empty());
        assert!(store.merge_unlocked_planets(&BTreeSet::new()).unwrap().is_empty());
        assert_eq!(store.unlocked_planets().len(), 3);
    }

    #[test]
    fn sets_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let install = InstallId::new();
        let lesson = LessonKey::new("coloria_prime", 2);
        {
            let kv = Arc::new(FileKvStore::open(dir.path()).unwrap());
            let mut store = UnlockStore::open(kv, install).unwrap();
            store.unlock_lesson(&lesson).unwrap();
            store.mark_lesson_completed(&lesson).unwrap();
            store.unlock_galaxy(&GalaxyKey::from("rainbow_nebula")).unwrap();
            store
                .award_badge(Badge::for_planet(&PlanetKey::from("coloria_prime"), "Color Captain"))
                .unwrap();
        }
        let kv = Arc::new(FileKvStore::open(dir.path()).unwrap());
        let store = UnlockStore::open(kv, install).unwrap();
        assert!(store.is_lesson_completed(&lesson));
        assert!(store.is_galaxy_unlocked(&GalaxyKey::from("rainbow_nebula")));
        assert!(store.has_badge("badge:coloria_prime"));
    }

    #[test]
    fn badges_are_unique_by_id() {
        let (_kv, mut store) = memory_store();
        let planet = PlanetKey::from("coloria_prime");
        assert!(store.award_badge(Badge::for_planet(&planet, "Color Captain")).unwrap());
        assert!(!store.award_badge(Badge::for_planet(&planet, "Renamed")).unwrap());
        assert_eq!(store.badges().len(), 1);
    }

    #[test]
    fn completion_and_galaxy_unlock_are_idempotent() {
        let (_kv, mut store) = memory_store();
        let lesson = LessonKey::new("coloria_prime", 1);
        assert!(store.mark_lesson_completed(&lesson).unwrap());
        assert!(!store.mark_lesson_completed(&lesson).unwrap());
        assert_eq!(store.completed_lessons().len(), 1);

        let galaxy = GalaxyKey::from("rainbow_nebula");
        assert!(store.unlock_galaxy(&galaxy).unwrap());
        assert!(!store.unlock_galaxy(&galaxy).unwrap());
        assert_eq!(store.unlocked_galaxies().len(), 1);
    }

    #[test]
    fn reset_clears_everything() {
        let (kv, mut store) = memory_store();
        let lesson = LessonKey::new("coloria_prime", 1);
        store.unlock_lesson(&lesson).unwrap();
        store.mark_lesson_completed(&lesson).unwrap();
        store.reset_for_testing().unwrap();
        assert!(store.is_empty());
        assert!(!store.is_lesson_completed(&lesson));
        assert!(kv.is_empty());
    }
}
