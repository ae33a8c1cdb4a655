//! The fatigue read path.
//!
//! Quest completion persists a per-day fatigue snapshot; this module serves
//! it back, recomputing from live quest counts when no snapshot exists yet
//! (a fresh day, or a character who has not completed anything today).

use chrono::NaiveDate;
use sqlx::PgPool;

use ascend_db::{FatigueStore, PostgresPool, QuestStore};
use ascend_progression::{FatigueBand, fatigue_ratio};
use ascend_types::CharacterId;

use crate::error::EngineError;

/// A character's fatigue for one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FatigueStatus {
    /// The bounded fatigue ratio.
    pub ratio: f64,
    /// Coarse band for presentation.
    pub band: FatigueBand,
    /// Instances completed that day.
    pub quests_completed: u32,
    /// Instances assigned that day.
    pub quests_assigned: u32,
}

/// Serves per-day fatigue snapshots.
pub struct FatigueService {
    pool: PgPool,
}

impl FatigueService {
    /// Create a service backed by the given pool.
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.inner().clone(),
        }
    }

    /// The character's fatigue for `day`.
    ///
    /// Prefers the persisted snapshot; falls back to counting the day's
    /// quest instances directly.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Db`] on query failure.
    pub async fn for_day(
        &self,
        character_id: CharacterId,
        day: NaiveDate,
    ) -> Result<FatigueStatus, EngineError> {
        let fatigue = FatigueStore::new(&self.pool);
        if let Some(log) = fatigue.get_for_day(character_id, day).await? {
            return Ok(FatigueStatus {
                ratio: log.fatigue_level,
                band: FatigueBand::from_ratio(log.fatigue_level),
                quests_completed: log.quests_completed,
                quests_assigned: log.quests_assigned,
            });
        }

        let quests = QuestStore::new(&self.pool);
        let mut conn = self.pool.acquire().await?;
        let (completed, assigned) = quests.day_counts(&mut conn, character_id, day).await?;
        let ratio = fatigue_ratio(completed, assigned);
        Ok(FatigueStatus {
            ratio,
            band: FatigueBand::from_ratio(ratio),
            quests_completed: completed,
            quests_assigned: assigned,
        })
    }
}
