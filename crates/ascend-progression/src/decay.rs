//! Daily stat-decay planning.
//!
//! The decay sweep runs once per day over every character's stats. This
//! module decides, for a single stat and a fixed `now`, whether decay
//! applies and what the new value is. The sweep persists the plan; nothing
//! here touches storage.
//!
//! Decay never updates `last_used_at` (only genuine use does), so a stat
//! left unused keeps decaying against an ever-growing day count. Re-running
//! the sweep within the same calendar day is a no-op thanks to the
//! `last_decayed_on` guard: one day's decay is applied exactly once.

use chrono::{DateTime, Utc};

use ascend_types::{CharacterStat, StatDefinition};

use crate::formulas::stat_decay;

/// Days of decay applied to a stat that has never been used.
///
/// A `None` `last_used_at` decays as exactly one day unused, not zero and
/// not unbounded. Changing this constant changes the decay economics for
/// every freshly unlocked stat.
pub const NEVER_USED_DECAY_DAYS: i64 = 1;

/// A single-sweep drop of at least this many points triggers a user-facing
/// warning message.
pub const SIGNIFICANT_DECAY_POINTS: f64 = 5.0;

/// The planned decay for one stat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayOutcome {
    /// Value before decay.
    pub old_value: f64,
    /// Value after decay (floored at zero).
    pub new_value: f64,
    /// Whole days since last use that the decay covers.
    pub days_unused: i64,
    /// Whether the drop is large enough to warrant a warning message.
    pub significant: bool,
}

/// Plan decay for one stat at a fixed `now`.
///
/// Returns `None` when no decay applies:
/// - the value is already at or below zero,
/// - the stat was used today (`last_used_at` within the last whole day),
/// - the sweep already decayed this stat today (`last_decayed_on`), or
/// - the proportional formula produced no decrease.
pub fn plan_stat_decay(
    stat: &CharacterStat,
    definition: &StatDefinition,
    now: DateTime<Utc>,
) -> Option<DecayOutcome> {
    if stat.current_value <= 0.0 {
        return None;
    }

    let today = now.date_naive();
    if stat.last_decayed_on == Some(today) {
        return None;
    }

    let days_unused = match stat.last_used_at {
        Some(last_used) => now.signed_duration_since(last_used).num_days(),
        None => NEVER_USED_DECAY_DAYS,
    };
    if days_unused <= 0 {
        // Used today (or a clock skew put the use in the future).
        return None;
    }

    let old_value = stat.current_value;
    let new_value = stat_decay(old_value, definition.decay_rate, days_unused);
    if new_value >= old_value {
        return None;
    }

    Some(DecayOutcome {
        old_value,
        new_value,
        days_unused,
        significant: old_value - new_value >= SIGNIFICANT_DECAY_POINTS,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use ascend_types::{
        CharacterId, CharacterStatId, StatCategory, StatDefinitionId,
    };

    use super::*;

    fn definition(decay_rate: f64) -> StatDefinition {
        StatDefinition {
            id: StatDefinitionId::new(),
            name: "Focus".to_owned(),
            category: StatCategory::Mental,
            description: "Concentration and attention span".to_owned(),
            min_value: 0.0,
            max_value: 100.0,
            decay_rate,
            unlock_level: 1,
            is_active: true,
        }
    }

    fn stat(value: f64, last_used_at: Option<DateTime<Utc>>) -> CharacterStat {
        CharacterStat {
            id: CharacterStatId::new(),
            character_id: CharacterId::new(),
            stat_definition_id: StatDefinitionId::new(),
            current_value: value,
            last_used_at,
            last_decayed_on: None,
            updated_at: Utc::now(),
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).single().unwrap()
    }

    #[test]
    fn floored_stat_is_skipped() {
        let now = fixed_now();
        let s = stat(0.0, Some(now - Duration::days(10)));
        assert!(plan_stat_decay(&s, &definition(0.03), now).is_none());
    }

    #[test]
    fn stat_used_today_is_skipped() {
        let now = fixed_now();
        let s = stat(40.0, Some(now - Duration::hours(3)));
        assert!(plan_stat_decay(&s, &definition(0.03), now).is_none());
    }

    #[test]
    fn never_used_stat_decays_as_one_day() {
        let now = fixed_now();
        let s = stat(50.0, None);
        let outcome = plan_stat_decay(&s, &definition(0.02), now).unwrap();
        assert_eq!(outcome.days_unused, NEVER_USED_DECAY_DAYS);
        // 50 - 50 * 0.02 * 1 = 49
        assert!((outcome.new_value - 49.0).abs() < f64::EPSILON);
        assert!(!outcome.significant);
    }

    #[test]
    fn decay_is_proportional_to_days_unused() {
        let now = fixed_now();
        let s = stat(50.0, Some(now - Duration::days(5)));
        let outcome = plan_stat_decay(&s, &definition(0.02), now).unwrap();
        assert_eq!(outcome.days_unused, 5);
        assert!((outcome.new_value - 45.0).abs() < f64::EPSILON);
        assert!((outcome.old_value - 50.0).abs() < f64::EPSILON);
        assert!(outcome.significant);
    }

    #[test]
    fn already_decayed_today_is_skipped() {
        let now = fixed_now();
        let mut s = stat(50.0, Some(now - Duration::days(5)));
        s.last_decayed_on = Some(now.date_naive());
        assert!(plan_stat_decay(&s, &definition(0.02), now).is_none());
    }

    #[test]
    fn two_same_day_sweeps_decay_once() {
        let now = fixed_now();
        let mut s = stat(50.0, Some(now - Duration::days(5)));
        let def = definition(0.02);

        let first = plan_stat_decay(&s, &def, now).unwrap();
        // The sweep persists the new value and stamps last_decayed_on, but
        // leaves last_used_at alone.
        s.current_value = first.new_value;
        s.last_decayed_on = Some(now.date_naive());

        let later_same_day = now + Duration::hours(6);
        assert!(
            plan_stat_decay(&s, &def, later_same_day).is_none(),
            "second sweep on the same day must not compound decay"
        );

        // The next day, decay resumes against the original last_used_at.
        let next_day = now + Duration::days(1);
        let second = plan_stat_decay(&s, &def, next_day).unwrap();
        assert_eq!(second.days_unused, 6);
    }

    #[test]
    fn zero_rate_produces_no_outcome() {
        let now = fixed_now();
        let s = stat(50.0, Some(now - Duration::days(5)));
        assert!(plan_stat_decay(&s, &definition(0.0), now).is_none());
    }
}
