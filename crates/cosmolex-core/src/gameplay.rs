//! Inbound gameplay operations.

use std::sync::Arc;

use chrono::NaiveDate;
use cosmolex_catalog::PlanetDef;
use cosmolex_ledger::StreakAdvance;
use cosmolex_types::{Badge, GameType, PlanetRef, ProgressEvent, SceneId, StarSource};

use crate::engine::{ChangeOrigin, Outcome, ProgressionEngine};
use crate::error::ProgressError;

impl ProgressionEngine {
    /// Complete a lesson and grant its reward.
    ///
    /// The lesson is marked completed and the next lesson in order is
    /// unlocked. `stars_earned` is credited to the total and to the planet
    /// only on the first completion; repeat completions are gating no-ops.
    /// Completing the last open lesson of a planet awards its badge.
    ///
    /// Completing a lesson that is still locked force-unlocks it and logs
    /// the anomaly. Completing a lesson on a locked planet is logged only.
    ///
    /// # Errors
    ///
    /// [`ProgressError::NotFound`] in strict mode for unknown references,
    /// [`ProgressError::Persistence`] when a write fails.
    pub fn complete_lesson(
        &mut self,
        planet: &PlanetRef,
        scene: SceneId,
        stars_earned: u32,
    ) -> Result<Outcome, ProgressError> {
        self.run(ChangeOrigin::Local, |engine, events| {
            engine.apply_lesson_completion(planet, scene, stars_earned, events)
        })
    }

    fn apply_lesson_completion(
        &mut self,
        planet: &PlanetRef,
        scene: SceneId,
        stars_earned: u32,
        events: &mut Vec<ProgressEvent>,
    ) -> Result<(), ProgressError> {
        let catalog = Arc::clone(&self.catalog);
        let Some(def) = catalog
            .resolve_planet(planet)
            .and_then(|key| catalog.planet(&key))
        else {
            return self.missing("planet", planet.to_string());
        };
        let lesson = def.lesson_key(scene);
        if catalog.lesson(&lesson).is_none() {
            return self.missing("lesson", lesson.to_string());
        }

        if !self.unlocks.is_planet_unlocked(&def.key) {
            tracing::warn!(
                planet = %def.key,
                threshold = def.star_threshold,
                stars = self.ledger.total_stars(),
                "Lesson completed on a locked planet"
            );
        }
        if !self.unlocks.is_lesson_unlocked(&lesson) {
            tracing::warn!(lesson = %lesson, "Completing a locked lesson, force-unlocking");
            if self.unlocks.unlock_lesson(&lesson)? {
                events.push(ProgressEvent::LessonUnlocked {
                    lesson: lesson.clone(),
                });
            }
        }

        if self.unlocks.mark_lesson_completed(&lesson)? {
            tracing::info!(lesson = %lesson, stars = stars_earned, "Lesson completed");
            events.push(ProgressEvent::LessonCompleted {
                lesson: lesson.clone(),
            });
        }
        if let Some(next) = catalog.next_lesson(&lesson) {
            if self.unlocks.unlock_lesson(&next)? {
                tracing::debug!(lesson = %next, "Lesson unlocked");
                events.push(ProgressEvent::LessonUnlocked { lesson: next });
            }
        }

        if self.ledger.is_reward_claimed(&lesson) {
            tracing::debug!(lesson = %lesson, stars = stars_earned, "Reward already claimed, ignoring replay");
        } else {
            self.earn_stars(stars_earned, StarSource::Lesson, Some(&lesson), events)?;
        }

        self.award_planet_badge(def, events)?;
        self.apply_unlock_rules(events)
    }

    /// Award the planet badge once every lesson is completed.
    fn award_planet_badge(
        &mut self,
        planet: &PlanetDef,
        events: &mut Vec<ProgressEvent>,
    ) -> Result<(), ProgressError> {
        if !self.is_planet_completed(planet) {
            return Ok(());
        }
        let badge = Badge::for_planet(&planet.key, planet.badge_name.clone());
        if self.unlocks.award_badge(badge.clone())? {
            tracing::info!(planet = %planet.key, badge = %badge.name, "Planet completed");
            events.push(ProgressEvent::BadgeEarned { badge });
            events.push(ProgressEvent::PlanetCompleted {
                planet: planet.key.clone(),
            });
        }
        Ok(())
    }

    /// Earn stars outside a lesson. Zero is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::Persistence`] when a write fails.
    pub fn add_stars(&mut self, amount: u32, source: StarSource) -> Result<Outcome, ProgressError> {
        self.run(ChangeOrigin::Local, |engine, events| {
            engine.earn_stars(amount, source, None, events)?;
            engine.apply_unlock_rules(events)
        })
    }

    /// Count one newly learned word.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::Persistence`] when a write fails.
    pub fn record_word_learned(&mut self) -> Result<Outcome, ProgressError> {
        self.run(ChangeOrigin::Local, |engine, events| {
            let change = engine.mutate_ledger(|ledger| ledger.add_words(1))?;
            tracing::debug!(words = engine.ledger.words_learned(), "Word learned");
            Self::emit_ledger_change(&change, events);
            Ok(())
        })
    }

    /// Count one finished mini-game and earn its stars.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::Persistence`] when a write fails.
    pub fn record_game_completed(
        &mut self,
        game_type: GameType,
        stars_earned: u32,
    ) -> Result<Outcome, ProgressError> {
        self.run(ChangeOrigin::Local, |engine, events| {
            let change = engine.mutate_ledger(|ledger| {
                let mut change = ledger.add_games_completed(1);
                change.absorb(ledger.add_stars(stars_earned));
                change
            })?;
            tracing::info!(
                game = ?game_type,
                stars = stars_earned,
                games = engine.ledger.games_completed(),
                source = ?StarSource::Game,
                "Game completed"
            );
            Self::emit_ledger_change(&change, events);
            engine.apply_unlock_rules(events)
        })
    }

    /// Record a login on `today`, advancing the streak and awarding the
    /// streak bonus. A second login on the same day is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::Persistence`] when a write fails.
    pub fn record_daily_login(&mut self, today: NaiveDate) -> Result<Outcome, ProgressError> {
        self.run(ChangeOrigin::Local, |engine, events| {
            let (login, change) = engine.mutate_ledger(|ledger| {
                let login = ledger.record_daily_login(today);
                let change = ledger.add_stars(login.bonus_stars);
                (login, change)
            })?;
            if login.advance == StreakAdvance::Unchanged {
                tracing::debug!(%today, "Login already recorded today");
                return Ok(());
            }

            tracing::info!(
                streak = login.streak,
                bonus = login.bonus_stars,
                advance = ?login.advance,
                source = ?StarSource::DailyLogin,
                "Daily login recorded"
            );
            for milestone in &login.milestones {
                tracing::info!(kind = %milestone.kind, value = milestone.value, "Milestone reached");
                events.push(ProgressEvent::MilestoneReached {
                    kind: milestone.kind,
                    value: milestone.value,
                });
            }
            Self::emit_ledger_change(&change, events);
            engine.apply_unlock_rules(events)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use cosmolex_catalog::starter_catalog;
    use cosmolex_store::MemoryKvStore;
    use cosmolex_types::{InstallId, LessonKey, LessonState, MilestoneKind, PlanetKey};

    use super::*;
    use crate::engine::CatalogMode;
    use crate::engine::tests::engine_with_log;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn completing_first_lesson_unlocks_the_next() {
        let (mut engine, log, _kv) = engine_with_log(CatalogMode::Strict);
        let outcome = engine.complete_lesson(&"coloria_prime".into(), 1, 3).unwrap();

        assert_eq!(
            engine.lesson_state(&"coloria_prime".into(), 1).unwrap(),
            LessonState::Completed
        );
        assert_eq!(
            engine.lesson_state(&"coloria_prime".into(), 2).unwrap(),
            LessonState::Unlocked
        );
        assert_eq!(
            engine.lesson_state(&"coloria_prime".into(), 3).unwrap(),
            LessonState::Locked
        );
        assert_eq!(engine.ledger().total_stars(), 3);
        assert_eq!(engine.ledger().planet_stars(&PlanetKey::from("coloria_prime")), 3);
        assert_eq!(
            outcome.events,
            vec![
                ProgressEvent::LessonCompleted {
                    lesson: LessonKey::new("coloria_prime", 1)
                },
                ProgressEvent::LessonUnlocked {
                    lesson: LessonKey::new("coloria_prime", 2)
                },
                ProgressEvent::StarsChanged { total: 3, delta: 3 },
            ]
        );
        assert_eq!(log.events(), outcome.events);
    }

    #[test]
    fn repeat_completion_does_not_award_again() {
        let (mut engine, _log, _kv) = engine_with_log(CatalogMode::Strict);
        engine.complete_lesson(&"coloria_prime".into(), 1, 3).unwrap();
        let before = engine.snapshot();

        let replay = engine.complete_lesson(&"coloria_prime".into(), 1, 5).unwrap();
        assert!(replay.is_noop());
        assert_eq!(engine.ledger().total_stars(), 3);
        assert_eq!(engine.snapshot(), before);
        assert_eq!(
            engine
                .unlocks()
                .completed_lessons()
                .iter()
                .filter(|l| **l == LessonKey::new("coloria_prime", 1))
                .count(),
            1
        );
    }

    #[test]
    fn completing_locked_lesson_force_unlocks_it() {
        let (mut engine, _log, _kv) = engine_with_log(CatalogMode::Strict);
        let outcome = engine.complete_lesson(&"coloria_prime".into(), 3, 2).unwrap();
        assert!(outcome.events.contains(&ProgressEvent::LessonUnlocked {
            lesson: LessonKey::new("coloria_prime", 3)
        }));
        assert_eq!(
            engine.lesson_state(&"coloria_prime".into(), 3).unwrap(),
            LessonState::Completed
        );
        assert_eq!(
            engine.lesson_state(&"coloria_prime".into(), 4).unwrap(),
            LessonState::Unlocked
        );
        assert_eq!(
            engine.lesson_state(&"coloria_prime".into(), 2).unwrap(),
            LessonState::Locked
        );
    }

    #[test]
    fn completing_on_locked_planet_still_applies() {
        let (mut engine, _log, _kv) = engine_with_log(CatalogMode::Strict);
        engine.complete_lesson(&"musica_nova".into(), 1, 2).unwrap();
        assert!(!engine.is_planet_unlocked(&"musica_nova".into()));
        assert_eq!(engine.ledger().total_stars(), 2);
        assert_eq!(
            engine.lesson_state(&"musica_nova".into(), 1).unwrap(),
            LessonState::Completed
        );
    }

    #[test]
    fn finishing_a_planet_awards_its_badge_once() {
        let (mut engine, _log, _kv) = engine_with_log(CatalogMode::Strict);
        for scene in 1..=3 {
            let outcome = engine.complete_lesson(&"coloria_prime".into(), scene, 1).unwrap();
            assert_eq!(outcome.count("badge_earned"), 0);
        }
        let last = engine.complete_lesson(&"coloria_prime".into(), 4, 1).unwrap();
        assert_eq!(last.count("badge_earned"), 1);
        assert_eq!(last.count("planet_completed"), 1);
        assert!(engine.unlocks().has_badge("badge:coloria_prime"));

        let again = engine.complete_lesson(&"coloria_prime".into(), 4, 1).unwrap();
        assert!(again.is_noop());
    }

    #[test]
    fn legacy_planet_id_completes_canonical_lesson() {
        let (mut engine, _log, _kv) = engine_with_log(CatalogMode::Strict);
        engine.complete_lesson(&PlanetRef::Legacy(1), 1, 2).unwrap();
        assert!(engine
            .unlocks()
            .is_lesson_completed(&LessonKey::new("coloria_prime", 1)));
    }

    #[test]
    fn unknown_planet_strict_vs_lenient() {
        let (mut strict, _log, _kv) = engine_with_log(CatalogMode::Strict);
        assert!(matches!(
            strict.complete_lesson(&"atlantis".into(), 1, 3),
            Err(ProgressError::NotFound { kind: "planet", .. })
        ));

        let (mut lenient, _log, _kv) = engine_with_log(CatalogMode::Lenient);
        let outcome = lenient.complete_lesson(&"atlantis".into(), 1, 3).unwrap();
        assert!(outcome.is_noop());
        assert_eq!(lenient.ledger().total_stars(), 0);
    }

    #[test]
    fn big_award_emits_a_single_level_up() {
        let (mut engine, log, _kv) = engine_with_log(CatalogMode::Strict);
        let outcome = engine.add_stars(175, StarSource::Bonus).unwrap();
        assert_eq!(engine.ledger().current_level(), 4);
        assert_eq!(outcome.count("level_up"), 1);
        assert!(outcome
            .events
            .contains(&ProgressEvent::LevelUp { new_level: 4 }));
        assert_eq!(
            log.events().iter().filter(|e| e.kind() == "level_up").count(),
            1
        );
    }

    #[test]
    fn zero_stars_is_a_noop() {
        let (mut engine, _log, _kv) = engine_with_log(CatalogMode::Strict);
        assert!(engine.add_stars(0, StarSource::Bonus).unwrap().is_noop());
    }

    #[test]
    fn stars_never_decrease_and_level_tracks_stars() {
        let (mut engine, _log, _kv) = engine_with_log(CatalogMode::Strict);
        let mut previous = 0;
        for (i, amount) in [0_u32, 7, 43, 1, 99, 0, 250].into_iter().enumerate() {
            if i % 2 == 0 {
                engine.add_stars(amount, StarSource::Bonus).unwrap();
            } else {
                let mut doc = engine.remote_document(chrono::Utc::now());
                doc.total_stars = amount;
                engine.apply_remote_snapshot(Some(&doc)).unwrap();
            }
            let stars = engine.ledger().total_stars();
            assert!(stars >= previous);
            assert_eq!(engine.ledger().current_level(), stars / 50 + 1);
            previous = stars;
        }
    }

    #[test]
    fn words_and_games_reach_milestones() {
        let (mut engine, _log, _kv) = engine_with_log(CatalogMode::Strict);
        let mut milestones = Vec::new();
        for _ in 0..10 {
            let outcome = engine.record_word_learned().unwrap();
            milestones.extend(outcome.events);
        }
        assert_eq!(
            milestones,
            vec![ProgressEvent::MilestoneReached {
                kind: MilestoneKind::WordsLearned,
                value: 10
            }]
        );

        for n in 1..=5 {
            let outcome = engine.record_game_completed(GameType::Spelling, 2).unwrap();
            assert_eq!(outcome.count("milestone_reached"), usize::from(n == 5));
        }
        assert_eq!(engine.ledger().games_completed(), 5);
        assert_eq!(engine.ledger().total_stars(), 10);
    }

    #[test]
    fn daily_login_streak_and_bonus() {
        let (mut engine, _log, _kv) = engine_with_log(CatalogMode::Strict);
        let first = engine.record_daily_login(day(1)).unwrap();
        assert!(first.events.contains(&ProgressEvent::StarsChanged { total: 1, delta: 1 }));
        assert!(engine.record_daily_login(day(1)).unwrap().is_noop());

        engine.record_daily_login(day(2)).unwrap();
        let third = engine.record_daily_login(day(3)).unwrap();
        assert!(third.events.contains(&ProgressEvent::MilestoneReached {
            kind: MilestoneKind::LoginStreak,
            value: 3
        }));
        // 1 + 2 + 3 bonus stars.
        assert_eq!(engine.ledger().total_stars(), 6);

        engine.record_daily_login(day(10)).unwrap();
        assert_eq!(engine.ledger().login_streak().current, 1);
        assert_eq!(engine.ledger().login_streak().longest, 3);
    }

    #[test]
    fn failed_write_is_reported_and_retry_succeeds() {
        let kv = Arc::new(MemoryKvStore::new());
        let mut engine = ProgressionEngine::open(
            Arc::new(starter_catalog().unwrap()),
            kv.clone(),
            InstallId::new(),
            CatalogMode::Strict,
        )
        .unwrap();

        kv.reject_writes(true);
        let failed = engine.complete_lesson(&"coloria_prime".into(), 1, 3);
        assert!(matches!(failed, Err(ProgressError::Persistence(_))));
        assert_eq!(
            engine.lesson_state(&"coloria_prime".into(), 1).unwrap(),
            LessonState::Unlocked
        );
        assert_eq!(engine.ledger().total_stars(), 0);

        kv.reject_writes(false);
        engine.complete_lesson(&"coloria_prime".into(), 1, 3).unwrap();
        assert_eq!(engine.ledger().total_stars(), 3);
        assert_eq!(
            engine.lesson_state(&"coloria_prime".into(), 2).unwrap(),
            LessonState::Unlocked
        );
    }

    #[test]
    fn retry_after_failed_ledger_write_pays_reward_once() {
        let (mut engine, _log, kv) = engine_with_log(CatalogMode::Strict);
        let lesson = LessonKey::new("coloria_prime", 1);

        // Completion and the next unlock persist; the reward write fails.
        kv.reject_writes_to(Some(":ledger"));
        let failed = engine.complete_lesson(&"coloria_prime".into(), 1, 3);
        assert!(matches!(failed, Err(ProgressError::Persistence(_))));
        assert!(engine.unlocks().is_lesson_completed(&lesson));
        assert!(!engine.ledger().is_reward_claimed(&lesson));
        assert_eq!(engine.ledger().total_stars(), 0);

        kv.reject_writes_to(None);
        engine.complete_lesson(&"coloria_prime".into(), 1, 3).unwrap();
        engine.complete_lesson(&"coloria_prime".into(), 1, 3).unwrap();
        assert_eq!(engine.ledger().total_stars(), 3);
        assert_eq!(engine.ledger().planet_stars(&PlanetKey::from("coloria_prime")), 3);
        assert!(engine.ledger().is_reward_claimed(&lesson));
    }

    #[test]
    fn claimed_reward_survives_reopen() {
        let kv = Arc::new(MemoryKvStore::new());
        let catalog: Arc<dyn cosmolex_catalog::ContentCatalog> =
            Arc::new(starter_catalog().unwrap());
        let install = InstallId::new();
        let mut engine =
            ProgressionEngine::open(Arc::clone(&catalog), kv.clone(), install, CatalogMode::Strict)
                .unwrap();
        engine.complete_lesson(&"coloria_prime".into(), 1, 3).unwrap();
        drop(engine);

        let mut engine =
            ProgressionEngine::open(catalog, kv, install, CatalogMode::Strict).unwrap();
        assert!(engine.complete_lesson(&"coloria_prime".into(), 1, 3).unwrap().is_noop());
        assert_eq!(engine.ledger().total_stars(), 3);
    }
}
