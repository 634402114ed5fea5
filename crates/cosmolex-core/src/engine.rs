//! The progression engine: single owner of unlock sets, ledger and sync
//! state for one install.
//!
//! Every public operation runs through a single `run` wrapper, which
//! buffers the events produced by each durable step, emits at most one
//! `LevelUp` for the whole operation, and dispatches the buffer to the
//! registered listeners. Events are only ever produced for changes that
//! were durably written; when a later step fails, the events of the steps
//! that did persist are still delivered before the error is returned.
//!
//! The unlock rules live in `unlock.rs`, the gameplay operations in
//! `gameplay.rs`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use cosmolex_catalog::ContentCatalog;
use cosmolex_ledger::{LedgerChange, ProgressionLedger};
use cosmolex_store::{KeyValueStore, LedgerStore, UnlockStore};
use cosmolex_types::{
    InstallId, LessonKey, ProgressEvent, ProgressSnapshot, RemoteProgressDocument, StarSource,
};

use crate::error::ProgressError;
use crate::listener::{ListenerRegistry, ProgressListener};
use crate::sync::{SyncReconciler, plan_merge, remote_is_behind};

/// How unknown catalog references are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogMode {
    /// Return [`ProgressError::NotFound`] (development).
    Strict,
    /// Log a warning and treat the call as a no-op (production).
    #[default]
    Lenient,
}

impl CatalogMode {
    /// Mode for the `catalog.strict` config flag.
    pub const fn from_strict(strict: bool) -> Self {
        if strict { Self::Strict } else { Self::Lenient }
    }
}

/// Events produced by one operation, in the order they happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Emitted events. Empty when the call was a no-op.
    pub events: Vec<ProgressEvent>,
}

impl Outcome {
    /// Whether the call changed nothing observable.
    pub fn is_noop(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events whose [`ProgressEvent::kind`] equals `kind`.
    pub fn count(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }
}

/// Result of merging a remote document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Events produced by the merge and the unlock re-check after it.
    pub outcome: Outcome,
    /// Whether merged state should be pushed back to the remote copy.
    pub push_needed: bool,
}

/// Where a state change originated. Only local changes mark the remote
/// copy as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChangeOrigin {
    Local,
    Remote,
    Reset,
}

/// Orchestrates the catalog, unlock store, ledger and sync state.
///
/// Single-writer: all mutation goes through `&mut self`. Concurrent callers
/// are serialized by [`crate::actor::ProgressionActor`].
pub struct ProgressionEngine {
    pub(crate) catalog: Arc<dyn ContentCatalog>,
    pub(crate) unlocks: UnlockStore,
    pub(crate) ledger_store: LedgerStore,
    pub(crate) ledger: ProgressionLedger,
    pub(crate) listeners: ListenerRegistry,
    pub(crate) sync: SyncReconciler,
    pub(crate) mode: CatalogMode,
}

impl core::fmt::Debug for ProgressionEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProgressionEngine")
            .field("unlocks", &self.unlocks)
            .field("ledger", &self.ledger)
            .field("listeners", &self.listeners)
            .field("sync", &self.sync)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl ProgressionEngine {
    /// Load the state of `install` from `kv`, seeding whatever is missing.
    ///
    /// Seeding runs on every open and only fills gaps, so an install whose
    /// first run stopped halfway through seeding is completed here. After
    /// loading, the unlock rules are re-evaluated so content added to the
    /// catalog since the last run is unlocked when already earned.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::Persistence`] if stored state cannot be
    /// read or the seed state cannot be written.
    pub fn open(
        catalog: Arc<dyn ContentCatalog>,
        kv: Arc<dyn KeyValueStore>,
        install: InstallId,
        mode: CatalogMode,
    ) -> Result<Self, ProgressError> {
        let unlocks = UnlockStore::open(Arc::clone(&kv), install)?;
        let ledger_store = LedgerStore::new(kv, install);
        let stored = ledger_store.load()?;
        let ledger_missing = stored.is_none();
        let ledger = stored.map_or_else(ProgressionLedger::new, ProgressionLedger::from_record);

        let mut engine = Self {
            catalog,
            unlocks,
            ledger_store,
            ledger,
            listeners: ListenerRegistry::new(),
            sync: SyncReconciler::new(),
            mode,
        };

        let mut events = Vec::new();
        engine.seed(ledger_missing, &mut events)?;
        engine.apply_unlock_rules(&mut events)?;

        tracing::info!(
            install = %install,
            stars = engine.ledger.total_stars(),
            level = engine.ledger.current_level(),
            planets = engine.unlocks.unlocked_planets().len(),
            repaired = events.len(),
            "Progression engine ready"
        );
        Ok(engine)
    }

    /// Unlock the first galaxy, planet and lesson, and write zeroed
    /// counters when `write_ledger` is set. Elements already present are
    /// left alone.
    fn seed(
        &mut self,
        write_ledger: bool,
        events: &mut Vec<ProgressEvent>,
    ) -> Result<(), ProgressError> {
        let catalog = Arc::clone(&self.catalog);
        let before = events.len();

        if let Some(galaxy) = catalog.first_galaxy() {
            if self.unlocks.unlock_galaxy(&galaxy.key)? {
                events.push(ProgressEvent::GalaxyUnlocked {
                    key: galaxy.key.clone(),
                });
            }
        }
        if let Some(planet) = catalog.planets().first() {
            self.unlock_planet(planet, events)?;
            if let Some(lesson) = catalog.first_lesson(&planet.key) {
                if self.unlocks.unlock_lesson(&lesson)? {
                    events.push(ProgressEvent::LessonUnlocked { lesson });
                }
            }
        }
        if write_ledger {
            self.ledger_store.save(self.ledger.record())?;
        }

        if write_ledger || events.len() > before {
            tracing::info!(install = %self.unlocks.install(), "Seeded progression state");
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Operation plumbing
    // -------------------------------------------------------------------------

    /// Run one operation: buffer its events, add a single `LevelUp` when
    /// the level increased, track remote staleness and dispatch.
    pub(crate) fn run<F>(&mut self, origin: ChangeOrigin, op: F) -> Result<Outcome, ProgressError>
    where
        F: FnOnce(&mut Self, &mut Vec<ProgressEvent>) -> Result<(), ProgressError>,
    {
        let level_before = self.ledger.current_level();
        let stars_before = self.ledger.total_stars();
        let planets_before = self.unlocks.unlocked_planets().len();

        let mut events = Vec::new();
        let result = op(self, &mut events);

        let level_after = self.ledger.current_level();
        if level_after > level_before {
            tracing::info!(from = level_before, to = level_after, "Level up");
            events.push(ProgressEvent::LevelUp {
                new_level: level_after,
            });
        }

        let remote_fields_changed = self.ledger.total_stars() != stars_before
            || self.unlocks.unlocked_planets().len() != planets_before;
        if origin == ChangeOrigin::Local && remote_fields_changed {
            self.sync.note_local_change();
        }

        self.listeners.dispatch(&events);
        result.map(|()| Outcome { events })
    }

    /// Apply `f` to a copy of the ledger, persist it, then commit.
    pub(crate) fn mutate_ledger<T>(
        &mut self,
        f: impl FnOnce(&mut ProgressionLedger) -> T,
    ) -> Result<T, ProgressError> {
        let mut next = self.ledger.clone();
        let out = f(&mut next);
        if next != self.ledger {
            self.ledger_store.save(next.record())?;
            self.ledger = next;
        }
        Ok(out)
    }

    /// Translate a ledger change into `StarsChanged`/`MilestoneReached`.
    /// `LevelUp` is added once per operation by `run`.
    pub(crate) fn emit_ledger_change(change: &LedgerChange, events: &mut Vec<ProgressEvent>) {
        if change.stars_changed() {
            events.push(ProgressEvent::StarsChanged {
                total: change.stars_after,
                delta: change.star_delta(),
            });
        }
        if change.fuel_cells_awarded > 0 || change.crystals_awarded > 0 {
            tracing::debug!(
                fuel_cells = change.fuel_cells_awarded,
                crystals = change.crystals_awarded,
                "Collectibles awarded"
            );
        }
        for milestone in &change.milestones {
            tracing::info!(kind = %milestone.kind, value = milestone.value, "Milestone reached");
            events.push(ProgressEvent::MilestoneReached {
                kind: milestone.kind,
                value: milestone.value,
            });
        }
    }

    /// Earn `amount` stars from `source`.
    ///
    /// With a `reward` lesson, the lesson's planet is credited and the
    /// reward is marked claimed in the same ledger write, so a retried call
    /// can never pay it twice.
    pub(crate) fn earn_stars(
        &mut self,
        amount: u32,
        source: StarSource,
        reward: Option<&LessonKey>,
        events: &mut Vec<ProgressEvent>,
    ) -> Result<(), ProgressError> {
        if amount == 0 && reward.is_none() {
            return Ok(());
        }
        let change = self.mutate_ledger(|ledger| {
            if let Some(lesson) = reward {
                ledger.claim_lesson_reward(lesson);
                let credited = ledger.planet_stars(&lesson.planet).saturating_add(amount);
                ledger.set_planet_stars(&lesson.planet, credited);
            }
            ledger.add_stars(amount)
        })?;
        if change.stars_changed() {
            tracing::info!(
                amount,
                source = ?source,
                total = change.stars_after,
                "Stars earned"
            );
        }
        Self::emit_ledger_change(&change, events);
        Ok(())
    }

    /// Report an unknown catalog reference according to [`CatalogMode`].
    pub(crate) fn missing(&self, kind: &'static str, key: String) -> Result<(), ProgressError> {
        match self.mode {
            CatalogMode::Strict => Err(ProgressError::NotFound { kind, key }),
            CatalogMode::Lenient => {
                tracing::warn!(kind, key = %key, "Unknown catalog reference, ignoring call");
                Ok(())
            }
        }
    }

    // -------------------------------------------------------------------------
    // Listeners and accessors
    // -------------------------------------------------------------------------

    /// Register a listener. Listeners are called in registration order.
    pub fn register_listener(&mut self, listener: Box<dyn ProgressListener>) {
        self.listeners.register(listener);
    }

    /// The install this engine serves.
    pub const fn install(&self) -> InstallId {
        self.unlocks.install()
    }

    /// The content catalog.
    pub fn catalog(&self) -> &dyn ContentCatalog {
        self.catalog.as_ref()
    }

    /// The current ledger.
    pub const fn ledger(&self) -> &ProgressionLedger {
        &self.ledger
    }

    /// The current unlock sets.
    pub const fn unlocks(&self) -> &UnlockStore {
        &self.unlocks
    }

    /// Sync lifecycle state.
    pub const fn sync(&self) -> &SyncReconciler {
        &self.sync
    }

    /// Mutable sync lifecycle state, for the component driving the remote.
    pub const fn sync_mut(&mut self) -> &mut SyncReconciler {
        &mut self.sync
    }

    /// Read model of the whole state.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            install: self.install(),
            level: self.ledger.current_level(),
            ledger: self.ledger.record().clone(),
            unlocked_lessons: self.unlocks.unlocked_lessons().clone(),
            completed_lessons: self.unlocks.completed_lessons().clone(),
            unlocked_planets: self.unlocks.unlocked_planets().clone(),
            unlocked_galaxies: self.unlocks.unlocked_galaxies().clone(),
            badges: self.unlocks.badges().clone(),
            sync: self.sync.status().clone(),
        }
    }

    // -------------------------------------------------------------------------
    // Remote reconciliation
    // -------------------------------------------------------------------------

    /// The document to push: current stars and unlocked planets.
    pub fn remote_document(&self, now: DateTime<Utc>) -> RemoteProgressDocument {
        RemoteProgressDocument {
            total_stars: self.ledger.total_stars(),
            unlocked_planets: self.unlocks.unlocked_planets().clone(),
            updated_at: now,
        }
    }

    /// Merge a fetched remote document (or its absence) into local state.
    ///
    /// Stars become `max(local, remote)` without awarding collectibles,
    /// remote planets are unioned in, and the unlock rules re-run so any
    /// threshold crossed by the merged total is caught. Applying the same
    /// document twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::Persistence`] if merged state could not be
    /// written. Nothing is lost remotely; the next round retries.
    pub fn apply_remote_snapshot(
        &mut self,
        remote: Option<&RemoteProgressDocument>,
    ) -> Result<MergeOutcome, ProgressError> {
        let outcome = self.run(ChangeOrigin::Remote, |engine, events| {
            if let Some(doc) = remote {
                engine.merge_document(doc, events)?;
            }
            engine.apply_unlock_rules(events)
        })?;

        let push_needed = self.sync.is_push_pending()
            || remote_is_behind(
                self.ledger.total_stars(),
                self.unlocks.unlocked_planets(),
                remote,
            );
        Ok(MergeOutcome {
            outcome,
            push_needed,
        })
    }

    fn merge_document(
        &mut self,
        doc: &RemoteProgressDocument,
        events: &mut Vec<ProgressEvent>,
    ) -> Result<(), ProgressError> {
        let local_stars = self.ledger.total_stars();
        let plan = plan_merge(local_stars, self.unlocks.unlocked_planets(), doc);
        if !plan.changes_local(local_stars) {
            tracing::debug!("Remote snapshot adds nothing");
            return Ok(());
        }

        if plan.merged_stars > local_stars {
            let change = self.mutate_ledger(|ledger| ledger.merge_total_stars(plan.merged_stars))?;
            tracing::info!(
                local = local_stars,
                remote = doc.total_stars,
                "Adopted remote star total"
            );
            Self::emit_ledger_change(&change, events);
        }

        let catalog = Arc::clone(&self.catalog);
        for key in self.unlocks.merge_unlocked_planets(&plan.adopted_planets)? {
            let display_name = catalog.planet(&key).map_or_else(
                || {
                    tracing::warn!(planet = %key, "Adopted remote planet missing from catalog");
                    key.to_string()
                },
                |planet| planet.display_name.clone(),
            );
            tracing::info!(planet = %key, "Planet unlocked from remote");
            events.push(ProgressEvent::PlanetUnlocked { key, display_name });
        }
        Ok(())
    }

    /// Clear all local progress and re-seed. Catalog content is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::Persistence`] if a removal or the re-seed
    /// fails.
    pub fn reset_for_testing(&mut self) -> Result<Outcome, ProgressError> {
        self.run(ChangeOrigin::Reset, |engine, events| {
            let stars_before = engine.ledger.total_stars();
            engine.unlocks.reset_for_testing()?;
            engine.ledger_store.clear()?;
            engine.ledger = ProgressionLedger::new();
            engine.sync.reset();
            if stars_before > 0 {
                events.push(ProgressEvent::StarsChanged {
                    total: 0,
                    delta: -i64::from(stars_before),
                });
            }
            engine.seed(true, events)?;
            engine.apply_unlock_rules(events)?;
            tracing::warn!(install = %engine.install(), "Progress reset");
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::collections::BTreeSet;

    use cosmolex_catalog::{CatalogBuilder, GalaxyDef, LessonDef, PlanetDef, starter_catalog};
    use cosmolex_store::MemoryKvStore;
    use cosmolex_types::{PlanetKey, SyncStatus};

    use super::*;
    use crate::listener::EventLog;

    /// Fresh engine over the starter catalog with an attached event log.
    pub(crate) fn engine_with_log(mode: CatalogMode) -> (ProgressionEngine, EventLog, Arc<MemoryKvStore>) {
        let kv = Arc::new(MemoryKvStore::new());
        let mut engine = ProgressionEngine::open(
            Arc::new(starter_catalog().unwrap()),
            kv.clone(),
            InstallId::new(),
            mode,
        )
        .unwrap();
        let log = EventLog::new();
        engine.register_listener(Box::new(log.clone()));
        (engine, log, kv)
    }

    fn doc(stars: u32, keys: &[&str]) -> RemoteProgressDocument {
        RemoteProgressDocument {
            total_stars: stars,
            unlocked_planets: keys.iter().map(|k| PlanetKey::from(*k)).collect(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn fresh_install_is_seeded() {
        let (engine, _log, _kv) = engine_with_log(CatalogMode::Strict);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.ledger.total_stars, 0);
        assert_eq!(snapshot.level, 1);
        assert_eq!(
            snapshot.unlocked_lessons,
            BTreeSet::from([LessonKey::new("coloria_prime", 1)])
        );
        assert_eq!(
            snapshot.unlocked_planets,
            BTreeSet::from([PlanetKey::from("coloria_prime")])
        );
        assert_eq!(snapshot.unlocked_galaxies.len(), 1);
        assert!(snapshot.completed_lessons.is_empty());
        assert_eq!(snapshot.sync, SyncStatus::NeverSynced);
    }

    #[test]
    fn state_survives_reopen() {
        let kv = Arc::new(MemoryKvStore::new());
        let catalog: Arc<dyn ContentCatalog> = Arc::new(starter_catalog().unwrap());
        let install = InstallId::new();
        {
            let mut engine =
                ProgressionEngine::open(Arc::clone(&catalog), kv.clone(), install, CatalogMode::Strict)
                    .unwrap();
            engine.add_stars(35, StarSource::Bonus).unwrap();
        }
        let engine =
            ProgressionEngine::open(catalog, kv, install, CatalogMode::Strict).unwrap();
        assert_eq!(engine.ledger().total_stars(), 35);
        assert!(engine.unlocks().is_planet_unlocked(&PlanetKey::from("toytopia_orbit")));
    }

    // --- Remote merge ---

    #[test]
    fn merge_adopts_remote_progress_and_rechecks() {
        let (mut engine, log, _kv) = engine_with_log(CatalogMode::Strict);
        engine.add_stars(40, StarSource::Bonus).unwrap();
        log.drain();

        let remote = doc(55, &["coloria_prime", "toytopia_orbit", "animania_wild"]);
        let merge = engine.apply_remote_snapshot(Some(&remote)).unwrap();

        assert_eq!(engine.ledger().total_stars(), 55);
        for key in ["coloria_prime", "toytopia_orbit", "animania_wild", "numeria_station"] {
            assert!(engine.unlocks().is_planet_unlocked(&PlanetKey::from(key)), "{key}");
        }
        // 55 crosses the wild_frontier galaxy threshold (50) on recheck.
        assert!(engine.unlocks().is_galaxy_unlocked(&"wild_frontier".into()));
        assert_eq!(merge.outcome.count("level_up"), 1);
        assert_eq!(merge.outcome.count("stars_changed"), 1);
        // Local has numeria_station, which the remote lacks.
        assert!(merge.push_needed);
        assert_eq!(log.events(), merge.outcome.events);
    }

    #[test]
    fn merge_never_awards_collectibles() {
        let (mut engine, _log, _kv) = engine_with_log(CatalogMode::Strict);
        engine.apply_remote_snapshot(Some(&doc(120, &[]))).unwrap();
        let record = engine.ledger().record();
        assert_eq!(record.total_stars, 120);
        assert_eq!(record.total_fuel_cells, 0);
        assert_eq!(record.total_crystals, 0);
    }

    #[test]
    fn merging_same_snapshot_twice_is_noop() {
        let (mut engine, _log, _kv) = engine_with_log(CatalogMode::Strict);
        let remote = doc(55, &["coloria_prime", "animania_wild"]);
        engine.apply_remote_snapshot(Some(&remote)).unwrap();
        let before = engine.snapshot();
        let again = engine.apply_remote_snapshot(Some(&remote)).unwrap();
        assert!(again.outcome.is_noop());
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn lower_remote_total_never_decreases_local() {
        let (mut engine, _log, _kv) = engine_with_log(CatalogMode::Strict);
        engine.add_stars(70, StarSource::Bonus).unwrap();
        let merge = engine.apply_remote_snapshot(Some(&doc(10, &["coloria_prime"]))).unwrap();
        assert_eq!(engine.ledger().total_stars(), 70);
        assert!(merge.push_needed);
    }

    #[test]
    fn missing_remote_document_requests_push() {
        let (mut engine, _log, _kv) = engine_with_log(CatalogMode::Strict);
        let merge = engine.apply_remote_snapshot(None).unwrap();
        assert!(merge.outcome.is_noop());
        assert!(merge.push_needed);
    }

    #[test]
    fn up_to_date_remote_needs_no_push() {
        let (mut engine, _log, _kv) = engine_with_log(CatalogMode::Strict);
        let current = engine.remote_document(Utc::now());
        let merge = engine.apply_remote_snapshot(Some(&current)).unwrap();
        assert!(!merge.push_needed);
    }

    #[test]
    fn failed_merge_write_leaves_state_and_reports_error() {
        let (mut engine, log, kv) = engine_with_log(CatalogMode::Strict);
        kv.reject_writes(true);
        let result = engine.apply_remote_snapshot(Some(&doc(80, &["animania_wild"])));
        assert!(matches!(result, Err(ProgressError::Persistence(_))));
        assert_eq!(engine.ledger().total_stars(), 0);
        assert!(!engine.unlocks().is_planet_unlocked(&PlanetKey::from("animania_wild")));
        assert!(log.events().is_empty());
    }

    #[test]
    fn reset_restores_seed_state() {
        let (mut engine, _log, kv) = engine_with_log(CatalogMode::Strict);
        engine.add_stars(200, StarSource::Bonus).unwrap();
        let outcome = engine.reset_for_testing().unwrap();
        assert_eq!(outcome.count("stars_changed"), 1);
        assert_eq!(engine.ledger().total_stars(), 0);
        assert_eq!(engine.unlocks().unlocked_planets().len(), 1);
        assert_eq!(engine.unlocks().unlocked_lessons().len(), 1);
        assert!(!kv.is_empty());
    }

    #[test]
    fn interrupted_seed_is_completed_on_next_open() {
        let catalog = CatalogBuilder::new()
            .galaxy(GalaxyDef {
                key: "home".into(),
                display_name: "Home".to_owned(),
                order_index: 1,
                star_threshold: 0,
            })
            .planet(PlanetDef {
                key: "a".into(),
                legacy_id: None,
                display_name: "A".to_owned(),
                galaxy: "home".into(),
                order_index: 1,
                star_threshold: 5,
                badge_name: "A badge".to_owned(),
                lessons: vec![LessonDef {
                    scene: 1,
                    order_index: 1,
                    title: "First".to_owned(),
                }],
            })
            .build()
            .unwrap();
        let catalog: Arc<dyn ContentCatalog> = Arc::new(catalog);
        let kv = Arc::new(MemoryKvStore::new());
        let install = InstallId::new();

        // The galaxy is written, then the planet write fails.
        kv.reject_writes_to(Some(":unlocked_planets"));
        let first = ProgressionEngine::open(Arc::clone(&catalog), kv.clone(), install, CatalogMode::Strict);
        assert!(matches!(first, Err(ProgressError::Persistence(_))));

        kv.reject_writes_to(None);
        let engine = ProgressionEngine::open(catalog, kv, install, CatalogMode::Strict).unwrap();
        assert!(engine.unlocks().is_galaxy_unlocked(&"home".into()));
        assert!(engine.unlocks().is_planet_unlocked(&PlanetKey::from("a")));
        assert!(engine.unlocks().is_lesson_unlocked(&LessonKey::new("a", 1)));
        assert_eq!(engine.ledger().total_stars(), 0);
    }

    #[test]
    fn reopening_a_seeded_install_changes_nothing() {
        let kv = Arc::new(MemoryKvStore::new());
        let catalog: Arc<dyn ContentCatalog> = Arc::new(starter_catalog().unwrap());
        let install = InstallId::new();
        let first =
            ProgressionEngine::open(Arc::clone(&catalog), kv.clone(), install, CatalogMode::Strict)
                .unwrap()
                .snapshot();
        let second = ProgressionEngine::open(catalog, kv, install, CatalogMode::Strict)
            .unwrap()
            .snapshot();
        assert_eq!(first, second);
    }

    #[test]
    fn remote_planet_missing_from_catalog_is_kept() {
        let (mut engine, _log, _kv) = engine_with_log(CatalogMode::Strict);
        let merge = engine
            .apply_remote_snapshot(Some(&doc(0, &["coloria_prime", "atlantis"])))
            .unwrap();

        assert!(engine.unlocks().is_planet_unlocked(&PlanetKey::from("atlantis")));
        assert_eq!(
            merge.outcome.events,
            vec![ProgressEvent::PlanetUnlocked {
                key: PlanetKey::from("atlantis"),
                display_name: "atlantis".to_owned(),
            }]
        );
        assert!(!merge.push_needed);
    }

    #[test]
    fn catalog_mode_from_flag() {
        assert_eq!(CatalogMode::from_strict(true), CatalogMode::Strict);
        assert_eq!(CatalogMode::from_strict(false), CatalogMode::Lenient);
    }
}
