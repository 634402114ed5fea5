//! Local key layout.
//!
//! # Key Patterns
//!
//! | Pattern | Payload |
//! |---------|---------|
//! | `install:id` | [`InstallId`] of this install |
//! | `progress:{install}:unlocked_lessons` | set of lesson keys |
//! | `progress:{install}:completed_lessons` | set of lesson keys |
//! | `progress:{install}:unlocked_planets` | set of planet keys |
//! | `progress:{install}:unlocked_galaxies` | set of galaxy keys |
//! | `progress:{install}:badges` | set of badges |
//! | `progress:{install}:ledger` | ledger record |
//!
//! Every payload is wrapped in a versioned envelope (see [`crate::record`]).

use cosmolex_types::InstallId;

/// Key holding the install identifier.
pub const INSTALL_ID_KEY: &str = "install:id";

/// The membership sets kept per install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SetKind {
    /// Lessons the learner may play.
    UnlockedLessons,
    /// Lessons finished at least once.
    CompletedLessons,
    /// Planets the learner may visit.
    UnlockedPlanets,
    /// Galaxies the learner may visit.
    UnlockedGalaxies,
    /// Badges awarded.
    Badges,
}

impl SetKind {
    /// Every set kind, in key order.
    pub const ALL: [Self; 5] = [
        Self::UnlockedLessons,
        Self::CompletedLessons,
        Self::UnlockedPlanets,
        Self::UnlockedGalaxies,
        Self::Badges,
    ];

    /// Key suffix for this set.
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::UnlockedLessons => "unlocked_lessons",
            Self::CompletedLessons => "completed_lessons",
            Self::UnlockedPlanets => "unlocked_planets",
            Self::UnlockedGalaxies => "unlocked_galaxies",
            Self::Badges => "badges",
        }
    }
}

/// Key of a membership set for an install.
pub fn set_key(install: InstallId, kind: SetKind) -> String {
    format!("progress:{install}:{}", kind.suffix())
}

/// Key of the ledger record for an install.
pub fn ledger_key(install: InstallId) -> String {
    format!("progress:{install}:ledger")
}

/// Remote document key for an install.
pub fn remote_key(install: InstallId) -> String {
    format!("remote:progress:{install}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_scoped_by_install() {
        let a = InstallId::new();
        let b = InstallId::new();
        assert_ne!(
            set_key(a, SetKind::UnlockedPlanets),
            set_key(b, SetKind::UnlockedPlanets)
        );
        assert!(ledger_key(a).ends_with(":ledger"));
    }

    #[test]
    fn set_kinds_have_distinct_suffixes() {
        let mut suffixes: Vec<&str> = SetKind::ALL.iter().map(|k| k.suffix()).collect();
        suffixes.sort_unstable();
        suffixes.dedup();
        assert_eq!(suffixes.len(), SetKind::ALL.len());
    }
}
