//! Enumeration types shared across the workspace.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Gating state of a single lesson.
///
/// Transitions are one-way: `Locked -> Unlocked -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum LessonState {
    /// Not yet reachable by the learner.
    Locked,
    /// Playable but not finished.
    Unlocked,
    /// Finished at least once.
    Completed,
}

/// Where a star award came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum StarSource {
    /// Completing a lesson scene.
    Lesson,
    /// Finishing a mini-game.
    Game,
    /// Free-standing bonus (rewards, promotions, companion gifts).
    Bonus,
    /// Daily login streak bonus.
    DailyLogin,
}

/// The mini-game families a learner can complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum GameType {
    /// Match a word to its picture.
    WordMatch,
    /// Spell a spoken word letter by letter.
    Spelling,
    /// Pick the picture for a spoken word.
    ListenAndTap,
    /// Put words in order to form a sentence.
    SentenceBuilder,
    /// Flip cards to find word pairs.
    MemoryCards,
}

/// Counter families that produce milestone events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MilestoneKind {
    /// Total words learned.
    WordsLearned,
    /// Total games completed.
    GamesCompleted,
    /// Consecutive daily logins.
    LoginStreak,
}

impl core::fmt::Display for MilestoneKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::WordsLearned => "words_learned",
            Self::GamesCompleted => "games_completed",
            Self::LoginStreak => "login_streak",
        };
        f.write_str(label)
    }
}
