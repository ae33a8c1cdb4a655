//! Quest definition and instance persistence.
//!
//! Instances drive the resolution path: the orchestrator locks the target
//! instance row, verifies it is still `Pending`, and flips it to a terminal
//! state in the same transaction that mutates the character. The store also
//! serves the assignment sweep (auto-assign templates, same-day dedupe) and
//! the fatigue recomputation (per-day completion/assignment counts).

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use ascend_types::{
    CharacterId, QuestDefinition, QuestDefinitionId, QuestInstance, QuestInstanceId,
    QuestStatEffect, QuestStatus, Recurrence, StatDefinitionId,
};

use crate::error::DbError;

/// Start of a UTC calendar day as a timestamp.
fn day_start(day: NaiveDate) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(day.and_time(NaiveTime::MIN), Utc)
}

/// Exclusive end of a UTC calendar day as a timestamp.
fn day_end(day: NaiveDate) -> DateTime<Utc> {
    day_start(day.checked_add_days(Days::new(1)).unwrap_or(day))
}

#[derive(sqlx::FromRow)]
struct InstanceRow {
    id: Uuid,
    character_id: Uuid,
    quest_definition_id: Uuid,
    status: String,
    assigned_at: DateTime<Utc>,
    deadline: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    failed_at: Option<DateTime<Utc>>,
    expired_at: Option<DateTime<Utc>>,
}

impl TryFrom<InstanceRow> for QuestInstance {
    type Error = DbError;

    fn try_from(row: InstanceRow) -> Result<Self, DbError> {
        let status = QuestStatus::parse(&row.status).ok_or_else(|| DbError::InvalidEnum {
            column: "quest_instances.status",
            value: row.status.clone(),
        })?;
        Ok(Self {
            id: QuestInstanceId::from(row.id),
            character_id: CharacterId::from(row.character_id),
            quest_definition_id: QuestDefinitionId::from(row.quest_definition_id),
            status,
            assigned_at: row.assigned_at,
            deadline: row.deadline,
            completed_at: row.completed_at,
            failed_at: row.failed_at,
            expired_at: row.expired_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DefinitionRow {
    id: Uuid,
    title: String,
    description: String,
    base_xp: i64,
    difficulty_multiplier: f64,
    is_mandatory: bool,
    recurrence: String,
    auto_assign: bool,
    deadline_hours: Option<i32>,
    completion_count: i64,
    is_active: bool,
}

impl TryFrom<DefinitionRow> for QuestDefinition {
    type Error = DbError;

    fn try_from(row: DefinitionRow) -> Result<Self, DbError> {
        let recurrence = Recurrence::parse(&row.recurrence).ok_or_else(|| DbError::InvalidEnum {
            column: "quest_definitions.recurrence",
            value: row.recurrence.clone(),
        })?;
        let deadline_hours = row
            .deadline_hours
            .map(|h| {
                u32::try_from(h).map_err(|_| DbError::OutOfRange {
                    column: "quest_definitions.deadline_hours",
                })
            })
            .transpose()?;
        let completion_count =
            u64::try_from(row.completion_count).map_err(|_| DbError::OutOfRange {
                column: "quest_definitions.completion_count",
            })?;
        Ok(Self {
            id: QuestDefinitionId::from(row.id),
            title: row.title,
            description: row.description,
            base_xp: row.base_xp,
            difficulty_multiplier: row.difficulty_multiplier,
            is_mandatory: row.is_mandatory,
            recurrence,
            auto_assign: row.auto_assign,
            deadline_hours,
            completion_count,
            is_active: row.is_active,
            stat_effects: Vec::new(),
        })
    }
}

/// Operations on the quest tables.
pub struct QuestStore<'a> {
    pool: &'a PgPool,
}

impl<'a> QuestStore<'a> {
    /// Create a new store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load an instance (locked `FOR UPDATE`) with its definition and
    /// stat effects, scoped to the owning character.
    ///
    /// Returns `None` when no instance matches the id + character pair:
    /// an instance belonging to a different character is indistinguishable
    /// from a missing one, by design.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure.
    pub async fn load_instance_for_update(
        &self,
        conn: &mut PgConnection,
        instance_id: QuestInstanceId,
        character_id: CharacterId,
    ) -> Result<Option<(QuestInstance, QuestDefinition)>, DbError> {
        let row = sqlx::query_as::<_, InstanceRow>(
            r"SELECT id, character_id, quest_definition_id, status, assigned_at,
                     deadline, completed_at, failed_at, expired_at
              FROM quest_instances
              WHERE id = $1 AND character_id = $2
              FOR UPDATE",
        )
        .bind(instance_id.into_inner())
        .bind(character_id.into_inner())
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let instance = QuestInstance::try_from(row)?;

        let def_row = sqlx::query_as::<_, DefinitionRow>(
            r"SELECT id, title, description, base_xp, difficulty_multiplier, is_mandatory,
                     recurrence, auto_assign, deadline_hours, completion_count, is_active
              FROM quest_definitions
              WHERE id = $1",
        )
        .bind(instance.quest_definition_id.into_inner())
        .fetch_one(&mut *conn)
        .await?;
        let mut definition = QuestDefinition::try_from(def_row)?;

        let effects: Vec<(Uuid, f64)> = sqlx::query_as(
            r"SELECT stat_definition_id, effect_multiplier
              FROM quest_stat_effects
              WHERE quest_definition_id = $1",
        )
        .bind(definition.id.into_inner())
        .fetch_all(&mut *conn)
        .await?;
        definition.stat_effects = effects
            .into_iter()
            .map(|(id, effect_multiplier)| QuestStatEffect {
                stat_definition_id: StatDefinitionId::from(id),
                effect_multiplier,
            })
            .collect();

        Ok(Some((instance, definition)))
    }

    /// Flip a Pending instance to `Completed`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure.
    pub async fn mark_completed(
        &self,
        conn: &mut PgConnection,
        instance_id: QuestInstanceId,
        now: DateTime<Utc>,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"UPDATE quest_instances
              SET status = 'completed', completed_at = $2
              WHERE id = $1",
        )
        .bind(instance_id.into_inner())
        .bind(now)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Flip a Pending instance to `Failed`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure.
    pub async fn mark_failed(
        &self,
        conn: &mut PgConnection,
        instance_id: QuestInstanceId,
        now: DateTime<Utc>,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"UPDATE quest_instances
              SET status = 'failed', failed_at = $2
              WHERE id = $1",
        )
        .bind(instance_id.into_inner())
        .bind(now)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Increment a definition's lifetime completion counter.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure.
    pub async fn increment_completion_count(
        &self,
        conn: &mut PgConnection,
        definition_id: QuestDefinitionId,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"UPDATE quest_definitions
              SET completion_count = completion_count + 1
              WHERE id = $1",
        )
        .bind(definition_id.into_inner())
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Count a character's completed and assigned instances for one UTC
    /// calendar day. Feeds the fatigue recomputation.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure.
    pub async fn day_counts(
        &self,
        conn: &mut PgConnection,
        character_id: CharacterId,
        day: NaiveDate,
    ) -> Result<(u32, u32), DbError> {
        let start = day_start(day);
        let end = day_end(day);
        let (completed, assigned): (i64, i64) = sqlx::query_as(
            r"SELECT
                  count(*) FILTER (WHERE status = 'completed'
                                   AND completed_at >= $2 AND completed_at < $3),
                  count(*) FILTER (WHERE assigned_at >= $2 AND assigned_at < $3)
              FROM quest_instances
              WHERE character_id = $1",
        )
        .bind(character_id.into_inner())
        .bind(start)
        .bind(end)
        .fetch_one(&mut *conn)
        .await?;

        let completed = u32::try_from(completed).map_err(|_| DbError::OutOfRange {
            column: "quest_instances(count completed)",
        })?;
        let assigned = u32::try_from(assigned).map_err(|_| DbError::OutOfRange {
            column: "quest_instances(count assigned)",
        })?;
        Ok((completed, assigned))
    }

    /// Active auto-assign definitions with the given recurrence.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure.
    pub async fn auto_assign_definitions(
        &self,
        recurrence: Recurrence,
    ) -> Result<Vec<QuestDefinition>, DbError> {
        let rows = sqlx::query_as::<_, DefinitionRow>(
            r"SELECT id, title, description, base_xp, difficulty_multiplier, is_mandatory,
                     recurrence, auto_assign, deadline_hours, completion_count, is_active
              FROM quest_definitions
              WHERE auto_assign AND is_active AND recurrence = $1
              ORDER BY title",
        )
        .bind(recurrence.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Whether the character already holds a Pending instance of this
    /// definition assigned on `day`. The assignment sweep's dedupe check.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure.
    pub async fn has_pending_assigned_on(
        &self,
        conn: &mut PgConnection,
        character_id: CharacterId,
        definition_id: QuestDefinitionId,
        day: NaiveDate,
    ) -> Result<bool, DbError> {
        let (exists,): (bool,) = sqlx::query_as(
            r"SELECT EXISTS (
                  SELECT 1 FROM quest_instances
                  WHERE character_id = $1 AND quest_definition_id = $2
                    AND status = 'pending'
                    AND assigned_at >= $3 AND assigned_at < $4
              )",
        )
        .bind(character_id.into_inner())
        .bind(definition_id.into_inner())
        .bind(day_start(day))
        .bind(day_end(day))
        .fetch_one(&mut *conn)
        .await?;
        Ok(exists)
    }

    /// Insert a freshly assigned instance.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure.
    pub async fn insert_instance(
        &self,
        conn: &mut PgConnection,
        instance: &QuestInstance,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO quest_instances
                  (id, character_id, quest_definition_id, status, assigned_at, deadline)
              VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(instance.id.into_inner())
        .bind(instance.character_id.into_inner())
        .bind(instance.quest_definition_id.into_inner())
        .bind(instance.status.as_str())
        .bind(instance.assigned_at)
        .bind(instance.deadline)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Expire every Pending instance whose deadline has passed.
    ///
    /// Returns the number of instances expired. A single statement, so the
    /// status check and flip are atomic per row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, DbError> {
        let result = sqlx::query(
            r"UPDATE quest_instances
              SET status = 'expired', expired_at = $1
              WHERE status = 'pending' AND deadline IS NOT NULL AND deadline < $1",
        )
        .bind(now)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
