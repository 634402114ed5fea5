//! Milestone tables and crossing detection.

use cosmolex_types::MilestoneKind;
use serde::{Deserialize, Serialize};

/// Words-learned milestone values.
pub const WORD_MILESTONES: &[u32] = &[10, 25, 50, 100, 250, 500];

/// Games-completed milestone values.
pub const GAME_MILESTONES: &[u32] = &[5, 10, 25, 50, 100];

/// Login-streak milestone values (consecutive days).
pub const STREAK_MILESTONES: &[u32] = &[3, 7, 14, 30];

/// A milestone value crossed by a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Counter family.
    pub kind: MilestoneKind,
    /// The milestone value reached.
    pub value: u32,
}

/// Milestone table for a counter family.
pub const fn table(kind: MilestoneKind) -> &'static [u32] {
    match kind {
        MilestoneKind::WordsLearned => WORD_MILESTONES,
        MilestoneKind::GamesCompleted => GAME_MILESTONES,
        MilestoneKind::LoginStreak => STREAK_MILESTONES,
    }
}

/// Milestones with `before < value <= after`, in ascending order.
pub fn crossed(kind: MilestoneKind, before: u32, after: u32) -> Vec<Milestone> {
    table(kind)
        .iter()
        .copied()
        .filter(|&value| before < value && value <= after)
        .map(|value| Milestone { kind, value })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_a_single_milestone() {
        let hits = crossed(MilestoneKind::WordsLearned, 9, 10);
        assert_eq!(
            hits,
            vec![Milestone {
                kind: MilestoneKind::WordsLearned,
                value: 10
            }]
        );
    }

    #[test]
    fn jumping_over_several_milestones_reports_each() {
        let hits: Vec<u32> = crossed(MilestoneKind::GamesCompleted, 0, 30)
            .into_iter()
            .map(|m| m.value)
            .collect();
        assert_eq!(hits, vec![5, 10, 25]);
    }

    #[test]
    fn staying_on_a_milestone_does_not_repeat_it() {
        assert!(crossed(MilestoneKind::LoginStreak, 3, 3).is_empty());
    }
}
