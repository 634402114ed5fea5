//! The progression ledger: authoritative counters for one learner.
//!
//! [`ProgressionLedger`] wraps a [`LedgerRecord`] and is the only code that
//! mutates it. Every mutator returns a [`LedgerChange`] describing what
//! moved, so callers can emit events without re-deriving anything.
//!
//! # Earning vs. merging
//!
//! - [`add_stars`] is the earning path: the total grows by `amount` and the
//!   collectibles tied to earning (fuel cells, crystals) are awarded.
//! - [`merge_total_stars`] is the reconciliation path: the total is *set* to
//!   `max(local, remote)` and no collectibles are awarded, so adopting a
//!   remote total never double-awards anything.
//!
//! [`add_stars`]: ProgressionLedger::add_stars
//! [`merge_total_stars`]: ProgressionLedger::merge_total_stars

use chrono::NaiveDate;
use cosmolex_types::{LedgerRecord, LessonKey, LoginStreak, MilestoneKind, PlanetKey};

use crate::level::level_for_stars;
use crate::milestones::{self, Milestone};
use crate::streak::{self, StreakAdvance};

/// Stars per crystal boundary.
pub const STARS_PER_CRYSTAL: u32 = 10;

// ---------------------------------------------------------------------------
// LedgerChange
// ---------------------------------------------------------------------------

/// What a single ledger mutation changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerChange {
    /// Star total before the mutation.
    pub stars_before: u32,
    /// Star total after the mutation.
    pub stars_after: u32,
    /// Derived level before the mutation.
    pub level_before: u32,
    /// Derived level after the mutation.
    pub level_after: u32,
    /// Fuel cells awarded by this mutation.
    pub fuel_cells_awarded: u32,
    /// Crystals awarded by this mutation.
    pub crystals_awarded: u32,
    /// Milestones crossed, in the order they were crossed.
    pub milestones: Vec<Milestone>,
}

impl LedgerChange {
    /// A change that moved nothing, observed at `stars`.
    pub fn unchanged(stars: u32) -> Self {
        let level = level_for_stars(stars);
        Self {
            stars_before: stars,
            stars_after: stars,
            level_before: level,
            level_after: level,
            fuel_cells_awarded: 0,
            crystals_awarded: 0,
            milestones: Vec::new(),
        }
    }

    /// Signed change of the star total.
    pub fn star_delta(&self) -> i64 {
        i64::from(self.stars_after).saturating_sub(i64::from(self.stars_before))
    }

    /// Whether the star total moved.
    pub const fn stars_changed(&self) -> bool {
        self.stars_after != self.stars_before
    }

    /// The final level reached, if the level increased.
    ///
    /// Crossing several thresholds in one mutation still yields a single
    /// value: the last level reached.
    pub const fn level_up(&self) -> Option<u32> {
        if self.level_after > self.level_before {
            Some(self.level_after)
        } else {
            None
        }
    }

    /// Fold a later change into this one.
    ///
    /// The result spans from this change's "before" to `later`'s "after".
    pub fn absorb(&mut self, later: Self) {
        self.stars_after = later.stars_after;
        self.level_after = later.level_after;
        self.fuel_cells_awarded = self
            .fuel_cells_awarded
            .saturating_add(later.fuel_cells_awarded);
        self.crystals_awarded = self.crystals_awarded.saturating_add(later.crystals_awarded);
        self.milestones.extend(later.milestones);
    }
}

/// Result of recording a daily login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// How the streak moved.
    pub advance: StreakAdvance,
    /// Streak length after the login.
    pub streak: u32,
    /// Bonus stars the caller should award (0 when unchanged).
    pub bonus_stars: u32,
    /// Streak milestones crossed.
    pub milestones: Vec<Milestone>,
}

// ---------------------------------------------------------------------------
// ProgressionLedger
// ---------------------------------------------------------------------------

/// Single-writer progression counters.
///
/// All arithmetic saturates; no counter can wrap. The current level is
/// never stored, only derived from the star total.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressionLedger {
    record: LedgerRecord,
}

impl ProgressionLedger {
    /// Create a ledger with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrate a ledger from a persisted record.
    pub const fn from_record(record: LedgerRecord) -> Self {
        Self { record }
    }

    /// Borrow the underlying record.
    pub const fn record(&self) -> &LedgerRecord {
        &self.record
    }

    /// Consume the ledger, returning its record.
    pub fn into_record(self) -> LedgerRecord {
        self.record
    }

    /// Total stars.
    pub const fn total_stars(&self) -> u32 {
        self.record.total_stars
    }

    /// Current level, always `total_stars / 50 + 1`.
    pub const fn current_level(&self) -> u32 {
        level_for_stars(self.record.total_stars)
    }

    /// Words learned so far.
    pub const fn words_learned(&self) -> u32 {
        self.record.words_learned
    }

    /// Games completed so far.
    pub const fn games_completed(&self) -> u32 {
        self.record.games_completed
    }

    /// Stars recorded for a planet (0 when none).
    pub fn planet_stars(&self, planet: &PlanetKey) -> u32 {
        self.record.planet_stars.get(planet).copied().unwrap_or(0)
    }

    /// Current login streak.
    pub const fn login_streak(&self) -> &LoginStreak {
        &self.record.login_streak
    }

    /// Earn stars.
    ///
    /// Awards one fuel cell per star and one crystal per
    /// [`STARS_PER_CRYSTAL`] boundary crossed.
    pub fn add_stars(&mut self, amount: u32) -> LedgerChange {
        let before = self.record.total_stars;
        if amount == 0 {
            return LedgerChange::unchanged(before);
        }

        let after = before.saturating_add(amount);
        let earned = after.saturating_sub(before);
        let crystals = (after / STARS_PER_CRYSTAL).saturating_sub(before / STARS_PER_CRYSTAL);

        self.record.total_stars = after;
        self.record.total_fuel_cells = self.record.total_fuel_cells.saturating_add(earned);
        self.record.total_crystals = self.record.total_crystals.saturating_add(crystals);

        LedgerChange {
            stars_before: before,
            stars_after: after,
            level_before: level_for_stars(before),
            level_after: level_for_stars(after),
            fuel_cells_awarded: earned,
            crystals_awarded: crystals,
            milestones: Vec::new(),
        }
    }

    /// Adopt a remote star total: `total = max(local, remote)`.
    ///
    /// Never decreases the total and never awards collectibles.
    pub fn merge_total_stars(&mut self, remote_stars: u32) -> LedgerChange {
        let before = self.record.total_stars;
        if remote_stars <= before {
            if remote_stars < before {
                tracing::debug!(
                    local = before,
                    remote = remote_stars,
                    "Remote star total behind local, keeping local"
                );
            }
            return LedgerChange::unchanged(before);
        }

        self.record.total_stars = remote_stars;
        LedgerChange {
            stars_before: before,
            stars_after: remote_stars,
            level_before: level_for_stars(before),
            level_after: level_for_stars(remote_stars),
            fuel_cells_awarded: 0,
            crystals_awarded: 0,
            milestones: Vec::new(),
        }
    }

    /// Count newly learned words.
    pub fn add_words(&mut self, count: u32) -> LedgerChange {
        let before = self.record.words_learned;
        let after = before.saturating_add(count);
        self.record.words_learned = after;

        let mut change = LedgerChange::unchanged(self.record.total_stars);
        change.milestones = milestones::crossed(MilestoneKind::WordsLearned, before, after);
        change
    }

    /// Count completed games.
    pub fn add_games_completed(&mut self, count: u32) -> LedgerChange {
        let before = self.record.games_completed;
        let after = before.saturating_add(count);
        self.record.games_completed = after;

        let mut change = LedgerChange::unchanged(self.record.total_stars);
        change.milestones = milestones::crossed(MilestoneKind::GamesCompleted, before, after);
        change
    }

    /// Set the star count recorded for a planet. Returns whether it changed.
    pub fn set_planet_stars(&mut self, planet: &PlanetKey, value: u32) -> bool {
        let previous = self.record.planet_stars.insert(planet.clone(), value);
        previous != Some(value)
    }

    /// Whether the completion reward for `lesson` has been paid.
    pub fn is_reward_claimed(&self, lesson: &LessonKey) -> bool {
        self.record.claimed_rewards.contains(lesson)
    }

    /// Mark the completion reward for `lesson` as paid. Returns `false` if
    /// it already was.
    pub fn claim_lesson_reward(&mut self, lesson: &LessonKey) -> bool {
        self.record.claimed_rewards.insert(lesson.clone())
    }

    /// Record a login on `today` and compute the streak bonus.
    ///
    /// The bonus is *not* added here; callers award it through
    /// [`add_stars`](Self::add_stars) so it follows the earning path.
    pub fn record_daily_login(&mut self, today: NaiveDate) -> LoginOutcome {
        let before = self.record.login_streak.current;
        let advance = streak::advance(&mut self.record.login_streak, today);
        let after = self.record.login_streak.current;

        let (bonus_stars, crossed) = if advance == StreakAdvance::Unchanged {
            (0, Vec::new())
        } else {
            // A reset restarts at 1, so only count milestones above the old run.
            let floor = if advance == StreakAdvance::Reset { 0 } else { before };
            (
                streak::daily_bonus(after),
                milestones::crossed(MilestoneKind::LoginStreak, floor, after),
            )
        };

        LoginOutcome {
            advance,
            streak: after,
            bonus_stars,
            milestones: crossed,
        }
    }

    /// Restore seed values.
    pub fn reset(&mut self) {
        self.record = LedgerRecord::default();
    }
}
