//! Daily upkeep sweeps: quest expiry and stale-streak resets.
//!
//! Both sweeps are single UPDATE statements in the data layer; this module
//! adds the expiration audit trail on top. They run from the midnight
//! scheduler alongside assignment and decay, and are safe to re-run.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, warn};

use ascend_db::{HistoryStore, PostgresPool, QuestStore, StreakStore};
use ascend_types::{CharacterId, ProgressEventKind, ProgressLog, ProgressLogId, QuestInstanceId};
use uuid::Uuid;

use crate::error::EngineError;

/// Expires overdue quests and resets broken streaks.
pub struct UpkeepService {
    pool: PgPool,
}

impl UpkeepService {
    /// Create a service backed by the given pool.
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.inner().clone(),
        }
    }

    /// Expire every pending instance whose deadline has passed, recording
    /// an audit entry per expired instance.
    ///
    /// Returns the number of instances expired.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Db`] on persistence failure.
    pub async fn expire_overdue_quests(&self, now: DateTime<Utc>) -> Result<u64, EngineError> {
        let quests = QuestStore::new(&self.pool);
        let history = HistoryStore::new(&self.pool);

        let expired = quests.expire_overdue(now).await?;
        if expired == 0 {
            return Ok(0);
        }

        // Audit the instances the UPDATE just flipped. Best effort: the
        // expiry itself has committed, so a logging failure only costs the
        // audit rows.
        let rows: Result<Vec<(Uuid, Uuid)>, sqlx::Error> = sqlx::query_as(
            r"SELECT id, character_id FROM quest_instances
              WHERE status = 'expired' AND expired_at = $1",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await;
        match rows {
            Ok(rows) => {
                let mut conn = self.pool.acquire().await?;
                for (instance_id, character_id) in rows {
                    let log = ProgressLog {
                        id: ProgressLogId::new(),
                        character_id: CharacterId::from(character_id),
                        quest_instance_id: Some(QuestInstanceId::from(instance_id)),
                        kind: ProgressEventKind::QuestExpired,
                        xp_change: 0,
                        level_before: None,
                        level_after: None,
                        metadata: None,
                        created_at: now,
                    };
                    history.append_progress(&mut conn, &log).await?;
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to audit expired quest instances");
            }
        }

        info!(expired, "quest expiry sweep finished");
        Ok(expired)
    }

    /// Zero every streak whose last counted day slipped past yesterday.
    ///
    /// Returns the number of streaks reset. Longest-streak records are
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Db`] on persistence failure.
    pub async fn reset_stale_streaks(&self, now: DateTime<Utc>) -> Result<u64, EngineError> {
        let streaks = StreakStore::new(&self.pool);
        let reset = streaks.reset_stale(now.date_naive(), now).await?;
        if reset > 0 {
            info!(reset, "stale streak sweep finished");
        }
        Ok(reset)
    }
}
