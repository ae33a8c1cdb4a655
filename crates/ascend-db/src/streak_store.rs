//! Streak persistence.
//!
//! One row per (character, cadence). The completion path upserts through
//! the transaction it runs in; the reset sweep runs a single statement over
//! all stale rows.

use chrono::{DateTime, Days, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use ascend_types::{CharacterId, Streak, StreakCadence, StreakId};

use crate::error::DbError;

#[derive(sqlx::FromRow)]
struct StreakRow {
    id: Uuid,
    character_id: Uuid,
    cadence: String,
    current_streak: i32,
    longest_streak: i32,
    last_completed_on: Option<NaiveDate>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StreakRow> for Streak {
    type Error = DbError;

    fn try_from(row: StreakRow) -> Result<Self, DbError> {
        let cadence = StreakCadence::parse(&row.cadence).ok_or_else(|| DbError::InvalidEnum {
            column: "streaks.cadence",
            value: row.cadence.clone(),
        })?;
        let current_streak = u32::try_from(row.current_streak).map_err(|_| DbError::OutOfRange {
            column: "streaks.current_streak",
        })?;
        let longest_streak = u32::try_from(row.longest_streak).map_err(|_| DbError::OutOfRange {
            column: "streaks.longest_streak",
        })?;
        Ok(Self {
            id: StreakId::from(row.id),
            character_id: CharacterId::from(row.character_id),
            cadence,
            current_streak,
            longest_streak,
            last_completed_on: row.last_completed_on,
            updated_at: row.updated_at,
        })
    }
}

/// Operations on the `streaks` table.
pub struct StreakStore<'a> {
    pool: &'a PgPool,
}

impl<'a> StreakStore<'a> {
    /// Create a new store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load a character's streak for one cadence, locked `FOR UPDATE`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure.
    pub async fn get_for_update(
        &self,
        conn: &mut PgConnection,
        character_id: CharacterId,
        cadence: StreakCadence,
    ) -> Result<Option<Streak>, DbError> {
        let row = sqlx::query_as::<_, StreakRow>(
            r"SELECT id, character_id, cadence, current_streak, longest_streak,
                     last_completed_on, updated_at
              FROM streaks
              WHERE character_id = $1 AND cadence = $2
              FOR UPDATE",
        )
        .bind(character_id.into_inner())
        .bind(cadence.as_str())
        .fetch_optional(&mut *conn)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert or update a streak record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure, or
    /// [`DbError::OutOfRange`] if a counter no longer fits its column.
    pub async fn upsert(&self, conn: &mut PgConnection, streak: &Streak) -> Result<(), DbError> {
        let current = i32::try_from(streak.current_streak).map_err(|_| DbError::OutOfRange {
            column: "streaks.current_streak",
        })?;
        let longest = i32::try_from(streak.longest_streak).map_err(|_| DbError::OutOfRange {
            column: "streaks.longest_streak",
        })?;
        sqlx::query(
            r"INSERT INTO streaks
                  (id, character_id, cadence, current_streak, longest_streak,
                   last_completed_on, updated_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7)
              ON CONFLICT (character_id, cadence) DO UPDATE
              SET current_streak = EXCLUDED.current_streak,
                  longest_streak = EXCLUDED.longest_streak,
                  last_completed_on = EXCLUDED.last_completed_on,
                  updated_at = EXCLUDED.updated_at",
        )
        .bind(streak.id.into_inner())
        .bind(streak.character_id.into_inner())
        .bind(streak.cadence.as_str())
        .bind(current)
        .bind(longest)
        .bind(streak.last_completed_on)
        .bind(streak.updated_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Zero every streak whose last completion predates yesterday.
    ///
    /// Returns the number of streaks reset. `longest_streak` is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure.
    pub async fn reset_stale(
        &self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        let Some(yesterday) = today.checked_sub_days(Days::new(1)) else {
            return Ok(0);
        };
        let result = sqlx::query(
            r"UPDATE streaks
              SET current_streak = 0, updated_at = $2
              WHERE current_streak > 0
                AND (last_completed_on IS NULL OR last_completed_on < $1)",
        )
        .bind(yesterday)
        .bind(now)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
