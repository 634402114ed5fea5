//! Daily login streak tracking.
//!
//! A login on the same calendar day as the previous one changes nothing.
//! A login on the following day extends the streak; any longer gap resets
//! it to one. A date earlier than the last recorded login (clock skew) is
//! ignored rather than rewinding the streak.

use chrono::NaiveDate;
use cosmolex_types::LoginStreak;

/// Upper bound on the daily bonus, reached on day seven of a streak.
pub const MAX_DAILY_BONUS_STARS: u32 = 7;

/// How a login affected the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakAdvance {
    /// First login ever.
    Started,
    /// Consecutive day.
    Extended,
    /// A day or more was missed; the streak restarted at one.
    Reset,
    /// Already logged in today, or the date went backwards.
    Unchanged,
}

/// Apply a login on `today` to `streak`.
pub fn advance(streak: &mut LoginStreak, today: NaiveDate) -> StreakAdvance {
    let outcome = match streak.last_login {
        None => {
            streak.current = 1;
            StreakAdvance::Started
        }
        Some(last) if today <= last => {
            if today < last {
                tracing::warn!(%today, %last, "Login date precedes last recorded login, ignoring");
            }
            return StreakAdvance::Unchanged;
        }
        Some(last) if last.succ_opt() == Some(today) => {
            streak.current = streak.current.saturating_add(1);
            StreakAdvance::Extended
        }
        Some(_) => {
            streak.current = 1;
            StreakAdvance::Reset
        }
    };

    streak.last_login = Some(today);
    streak.longest = streak.longest.max(streak.current);
    outcome
}

/// Bonus stars for logging in on day `streak` of a run.
pub fn daily_bonus(streak: u32) -> u32 {
    streak.min(MAX_DAILY_BONUS_STARS)
}
