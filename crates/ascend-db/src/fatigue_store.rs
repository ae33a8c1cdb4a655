//! Fatigue log persistence.
//!
//! One row per (character, calendar day) holding that day's quest counts
//! and the derived fatigue ratio. The completion path upserts after every
//! completion so same-day reads see the fed-forward value.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use ascend_types::{CharacterId, FatigueLog, FatigueLogId};

use crate::error::DbError;

#[derive(sqlx::FromRow)]
struct FatigueRow {
    id: Uuid,
    character_id: Uuid,
    date: NaiveDate,
    quests_completed: i32,
    quests_assigned: i32,
    fatigue_level: f64,
    created_at: DateTime<Utc>,
}

impl TryFrom<FatigueRow> for FatigueLog {
    type Error = DbError;

    fn try_from(row: FatigueRow) -> Result<Self, DbError> {
        let quests_completed =
            u32::try_from(row.quests_completed).map_err(|_| DbError::OutOfRange {
                column: "fatigue_logs.quests_completed",
            })?;
        let quests_assigned =
            u32::try_from(row.quests_assigned).map_err(|_| DbError::OutOfRange {
                column: "fatigue_logs.quests_assigned",
            })?;
        Ok(Self {
            id: FatigueLogId::from(row.id),
            character_id: CharacterId::from(row.character_id),
            date: row.date,
            quests_completed,
            quests_assigned,
            fatigue_level: row.fatigue_level,
            created_at: row.created_at,
        })
    }
}

/// Operations on the `fatigue_logs` table.
pub struct FatigueStore<'a> {
    pool: &'a PgPool,
}

impl<'a> FatigueStore<'a> {
    /// Create a new store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The fatigue log for one character and day, if recorded.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure.
    pub async fn get_for_day(
        &self,
        character_id: CharacterId,
        day: NaiveDate,
    ) -> Result<Option<FatigueLog>, DbError> {
        let row = sqlx::query_as::<_, FatigueRow>(
            r"SELECT id, character_id, date, quests_completed, quests_assigned,
                     fatigue_level, created_at
              FROM fatigue_logs
              WHERE character_id = $1 AND date = $2",
        )
        .bind(character_id.into_inner())
        .bind(day)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert or update the day's fatigue log.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure, or
    /// [`DbError::OutOfRange`] if a count no longer fits its column.
    pub async fn upsert(&self, conn: &mut PgConnection, log: &FatigueLog) -> Result<(), DbError> {
        let completed = i32::try_from(log.quests_completed).map_err(|_| DbError::OutOfRange {
            column: "fatigue_logs.quests_completed",
        })?;
        let assigned = i32::try_from(log.quests_assigned).map_err(|_| DbError::OutOfRange {
            column: "fatigue_logs.quests_assigned",
        })?;
        sqlx::query(
            r"INSERT INTO fatigue_logs
                  (id, character_id, date, quests_completed, quests_assigned,
                   fatigue_level, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7)
              ON CONFLICT (character_id, date) DO UPDATE
              SET quests_completed = EXCLUDED.quests_completed,
                  quests_assigned = EXCLUDED.quests_assigned,
                  fatigue_level = EXCLUDED.fatigue_level",
        )
        .bind(log.id.into_inner())
        .bind(log.character_id.into_inner())
        .bind(log.date)
        .bind(completed)
        .bind(assigned)
        .bind(log.fatigue_level)
        .bind(log.created_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
