//! Append-only history: the audit trail and user-facing messages.
//!
//! Progress logs are the source of truth for a character's progression
//! history. Every resolution and decay writes an immutable entry here;
//! rows are never updated or deleted. System messages are the notification
//! counterpart, mutable only in their read flag (owned by the API layer).

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use ascend_types::{
    CharacterId, ProgressEventKind, ProgressLog, ProgressLogId, SystemMessage,
};

use crate::error::DbError;

#[derive(sqlx::FromRow)]
struct ProgressRow {
    id: Uuid,
    character_id: Uuid,
    quest_instance_id: Option<Uuid>,
    kind: String,
    xp_change: i64,
    level_before: Option<i32>,
    level_after: Option<i32>,
    metadata: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProgressRow> for ProgressLog {
    type Error = DbError;

    fn try_from(row: ProgressRow) -> Result<Self, DbError> {
        let kind = ProgressEventKind::parse(&row.kind).ok_or_else(|| DbError::InvalidEnum {
            column: "progress_logs.kind",
            value: row.kind.clone(),
        })?;
        let level = |column, v: Option<i32>| {
            v.map(|v| u32::try_from(v).map_err(|_| DbError::OutOfRange { column }))
                .transpose()
        };
        Ok(Self {
            id: ProgressLogId::from(row.id),
            character_id: CharacterId::from(row.character_id),
            quest_instance_id: row.quest_instance_id.map(Into::into),
            kind,
            xp_change: row.xp_change,
            level_before: level("progress_logs.level_before", row.level_before)?,
            level_after: level("progress_logs.level_after", row.level_after)?,
            metadata: row.metadata,
            created_at: row.created_at,
        })
    }
}

/// Operations on the `progress_logs` and `system_messages` tables.
pub struct HistoryStore<'a> {
    pool: &'a PgPool,
}

impl<'a> HistoryStore<'a> {
    /// Create a new store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append an audit entry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure, or
    /// [`DbError::OutOfRange`] if a level no longer fits its column.
    pub async fn append_progress(
        &self,
        conn: &mut PgConnection,
        log: &ProgressLog,
    ) -> Result<(), DbError> {
        let level = |column, v: Option<u32>| {
            v.map(|v| i32::try_from(v).map_err(|_| DbError::OutOfRange { column }))
                .transpose()
        };
        sqlx::query(
            r"INSERT INTO progress_logs
                  (id, character_id, quest_instance_id, kind, xp_change,
                   level_before, level_after, metadata, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(log.id.into_inner())
        .bind(log.character_id.into_inner())
        .bind(log.quest_instance_id.map(ascend_types::QuestInstanceId::into_inner))
        .bind(log.kind.as_str())
        .bind(log.xp_change)
        .bind(level("progress_logs.level_before", log.level_before)?)
        .bind(level("progress_logs.level_after", log.level_after)?)
        .bind(&log.metadata)
        .bind(log.created_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Append a user-facing system message.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure.
    pub async fn append_message(
        &self,
        conn: &mut PgConnection,
        message: &SystemMessage,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO system_messages
                  (id, character_id, kind, title, content, is_read, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(message.id.into_inner())
        .bind(message.character_id.into_inner())
        .bind(message.kind.as_str())
        .bind(&message.title)
        .bind(&message.content)
        .bind(message.is_read)
        .bind(message.created_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// The most recent audit entries for a character, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure.
    pub async fn recent_progress(
        &self,
        character_id: CharacterId,
        limit: i64,
    ) -> Result<Vec<ProgressLog>, DbError> {
        let rows = sqlx::query_as::<_, ProgressRow>(
            r"SELECT id, character_id, quest_instance_id, kind, xp_change,
                     level_before, level_after, metadata, created_at
              FROM progress_logs
              WHERE character_id = $1
              ORDER BY created_at DESC, id DESC
              LIMIT $2",
        )
        .bind(character_id.into_inner())
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
