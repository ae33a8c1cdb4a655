//! The consecutive-completion streak state machine.
//!
//! A streak counts qualifying days (by cadence) with at least one
//! completion. Transitions are driven entirely by the gap between today and
//! the last counted day:
//!
//! - no record yet -> start a new streak at 1
//! - last counted day is today -> no-op (same-day completions never
//!   double-count)
//! - last counted day is yesterday -> extend
//! - anything older -> the streak broke, this completion starts a new one
//!
//! A record whose last counted day has slipped past yesterday without a new
//! completion is *stale*: the reset sweep zeroes it, since no completion
//! event will arrive to do so naturally.

use chrono::{Days, NaiveDate};

use ascend_types::Streak;

/// What a completion did to a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    /// No record existed; a new streak started at 1.
    Started,
    /// Today was already counted; nothing changed.
    AlreadyCountedToday,
    /// Yesterday was counted; the streak extended by one.
    Extended,
    /// The streak had broken; this completion restarted it at 1.
    Restarted,
}

/// The post-transition streak counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    /// New current streak length.
    pub current_streak: u32,
    /// New longest streak (monotone max over history).
    pub longest_streak: u32,
    /// The day now counted as the most recent completion.
    pub last_completed_on: NaiveDate,
    /// Which transition fired.
    pub transition: StreakTransition,
}

/// Apply a completion on `today` to an optional existing streak record.
///
/// Pure: the caller persists the returned counters (and skips the write on
/// [`StreakTransition::AlreadyCountedToday`]). `longest_streak` never
/// decreases through any transition.
pub fn apply_completion(existing: Option<&Streak>, today: NaiveDate) -> StreakUpdate {
    let Some(streak) = existing else {
        return StreakUpdate {
            current_streak: 1,
            longest_streak: 1,
            last_completed_on: today,
            transition: StreakTransition::Started,
        };
    };

    let yesterday = today.checked_sub_days(Days::new(1));

    if streak.last_completed_on == Some(today) {
        return StreakUpdate {
            current_streak: streak.current_streak,
            longest_streak: streak.longest_streak,
            last_completed_on: today,
            transition: StreakTransition::AlreadyCountedToday,
        };
    }

    let (current, transition) = if streak.last_completed_on.is_some()
        && streak.last_completed_on == yesterday
    {
        (streak.current_streak.saturating_add(1), StreakTransition::Extended)
    } else {
        (1, StreakTransition::Restarted)
    };

    StreakUpdate {
        current_streak: current,
        longest_streak: streak.longest_streak.max(current),
        last_completed_on: today,
        transition,
    }
}

/// Whether a streak should be zeroed by the reset sweep.
///
/// True when the record still claims a running streak but its last counted
/// day is older than yesterday: the character simply stopped completing
/// quests, so no completion event will reset it naturally.
pub fn is_stale(streak: &Streak, today: NaiveDate) -> bool {
    if streak.current_streak == 0 {
        return false;
    }
    match (streak.last_completed_on, today.checked_sub_days(Days::new(1))) {
        (Some(last), Some(yesterday)) => last < yesterday,
        // No recorded completion at all but a nonzero counter: reset.
        (None, _) => true,
        (_, None) => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ascend_types::{CharacterId, StreakCadence, StreakId};
    use chrono::Utc;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn streak(current: u32, longest: u32, last: Option<NaiveDate>) -> Streak {
        Streak {
            id: StreakId::new(),
            character_id: CharacterId::new(),
            cadence: StreakCadence::Daily,
            current_streak: current,
            longest_streak: longest,
            last_completed_on: last,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn first_completion_starts_at_one() {
        let update = apply_completion(None, date(2026, 8, 29));
        assert_eq!(update.current_streak, 1);
        assert_eq!(update.longest_streak, 1);
        assert_eq!(update.transition, StreakTransition::Started);
    }

    #[test]
    fn same_day_completion_is_a_no_op() {
        let today = date(2026, 8, 29);
        let s = streak(4, 7, Some(today));
        let update = apply_completion(Some(&s), today);
        assert_eq!(update.transition, StreakTransition::AlreadyCountedToday);
        assert_eq!(update.current_streak, 4);
        assert_eq!(update.longest_streak, 7);
    }

    #[test]
    fn consecutive_day_extends_and_tracks_longest() {
        let s = streak(4, 4, Some(date(2026, 8, 28)));
        let update = apply_completion(Some(&s), date(2026, 8, 29));
        assert_eq!(update.transition, StreakTransition::Extended);
        assert_eq!(update.current_streak, 5);
        assert_eq!(update.longest_streak, 5);
    }

    #[test]
    fn gap_resets_to_one_but_longest_survives() {
        let s = streak(6, 9, Some(date(2026, 8, 26)));
        let update = apply_completion(Some(&s), date(2026, 8, 29));
        assert_eq!(update.transition, StreakTransition::Restarted);
        assert_eq!(update.current_streak, 1);
        assert_eq!(update.longest_streak, 9);
    }

    #[test]
    fn longest_never_decreases_across_transitions() {
        let mut s = streak(0, 0, None);
        let mut day = date(2026, 8, 1);
        let mut longest_seen = 0;
        // Completions on days 1..=5, a skip, then two more.
        for offset in [0u64, 1, 2, 3, 4, 7, 8] {
            let today = day.checked_add_days(Days::new(offset)).unwrap();
            let update = apply_completion(Some(&s), today);
            assert!(update.longest_streak >= longest_seen);
            longest_seen = update.longest_streak;
            s.current_streak = update.current_streak;
            s.longest_streak = update.longest_streak;
            s.last_completed_on = Some(update.last_completed_on);
        }
        day = day.checked_add_days(Days::new(8)).unwrap();
        assert_eq!(s.last_completed_on, Some(day));
        assert_eq!(s.longest_streak, 5);
        assert_eq!(s.current_streak, 2);
    }

    #[test]
    fn stale_detection_respects_yesterday_boundary() {
        let today = date(2026, 8, 29);
        assert!(!is_stale(&streak(3, 3, Some(date(2026, 8, 29))), today));
        assert!(!is_stale(&streak(3, 3, Some(date(2026, 8, 28))), today));
        assert!(is_stale(&streak(3, 3, Some(date(2026, 8, 27))), today));
        // Already zeroed records are left alone.
        assert!(!is_stale(&streak(0, 3, Some(date(2026, 8, 1))), today));
    }
}
