//! The midnight sweep scheduler.
//!
//! Runs the daily maintenance cycle at every UTC midnight: expire overdue
//! quests, reset stale streaks, assign recurring quests, then decay unused
//! stats. Weekly quests are assigned on Mondays. Every sweep is idempotent
//! within a day, so a missed or repeated cycle is harmless.

use std::time::Duration;

use chrono::{DateTime, Datelike, Days, NaiveTime, Utc, Weekday};
use tracing::{info, warn};

use ascend_db::PostgresPool;
use ascend_engine::{AssignmentSweep, DecaySweep, UpkeepService};
use ascend_types::Recurrence;

/// Fallback sleep when the next-midnight computation fails (calendar
/// overflow). Never hit in practice.
const FALLBACK_SLEEP: Duration = Duration::from_secs(60 * 60);

/// Drives the daily sweep cycle.
pub struct Scheduler {
    assignment: AssignmentSweep,
    decay: DecaySweep,
    upkeep: UpkeepService,
}

impl Scheduler {
    /// Create a scheduler backed by the given pool.
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            assignment: AssignmentSweep::new(pool),
            decay: DecaySweep::new(pool),
            upkeep: UpkeepService::new(pool),
        }
    }

    /// Run sweep cycles forever, one per UTC midnight.
    ///
    /// When `run_on_start` is set, a cycle runs immediately before the
    /// first sleep.
    pub async fn run_forever(&self, run_on_start: bool) {
        if run_on_start {
            self.run_cycle(Utc::now()).await;
        }
        loop {
            let now = Utc::now();
            let sleep = duration_until_next_midnight(now);
            info!(sleep_secs = sleep.as_secs(), "sleeping until next midnight");
            tokio::time::sleep(sleep).await;
            self.run_cycle(Utc::now()).await;
        }
    }

    /// Run one full sweep cycle at a fixed `now`.
    ///
    /// A failed sweep is logged and the cycle continues; the next midnight
    /// retries everything.
    pub async fn run_cycle(&self, now: DateTime<Utc>) {
        info!(day = %now.date_naive(), "daily sweep cycle starting");

        if let Err(err) = self.upkeep.expire_overdue_quests(now).await {
            warn!(error = %err, "quest expiry sweep failed");
        }
        if let Err(err) = self.upkeep.reset_stale_streaks(now).await {
            warn!(error = %err, "stale streak sweep failed");
        }
        if let Err(err) = self.assignment.assign_recurring(Recurrence::Daily, now).await {
            warn!(error = %err, "daily assignment sweep failed");
        }
        if now.weekday() == Weekday::Mon
            && let Err(err) = self.assignment.assign_recurring(Recurrence::Weekly, now).await
        {
            warn!(error = %err, "weekly assignment sweep failed");
        }
        if let Err(err) = self.decay.run(now).await {
            warn!(error = %err, "decay sweep failed");
        }

        info!(day = %now.date_naive(), "daily sweep cycle finished");
    }
}

/// Time remaining until the next UTC midnight.
pub fn duration_until_next_midnight(now: DateTime<Utc>) -> Duration {
    let next = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .map(|d| DateTime::<Utc>::from_naive_utc_and_offset(d.and_time(NaiveTime::MIN), Utc));
    let Some(next) = next else {
        return FALLBACK_SLEEP;
    };
    next.signed_duration_since(now)
        .to_std()
        .unwrap_or(FALLBACK_SLEEP)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

    use chrono::TimeZone;

    use super::*;

    #[test]
    fn midnight_distance_is_exact() {
        let now = Utc.with_ymd_and_hms(2026, 8, 29, 23, 59, 0).single().unwrap();
        assert_eq!(duration_until_next_midnight(now), Duration::from_secs(60));
    }

    #[test]
    fn just_after_midnight_waits_a_full_day() {
        let now = Utc.with_ymd_and_hms(2026, 8, 29, 0, 0, 1).single().unwrap();
        assert_eq!(
            duration_until_next_midnight(now),
            Duration::from_secs(24 * 60 * 60 - 1)
        );
    }
}
