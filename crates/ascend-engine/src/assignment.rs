//! Recurring quest assignment.
//!
//! The assignment sweep instantiates every active auto-assign quest
//! definition for every character, once per recurrence period. A character
//! who already holds a pending instance of a definition assigned today is
//! skipped, so re-running the sweep within the same day is a no-op.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use sqlx::PgPool;
use tracing::{info, warn};

use ascend_db::{CharacterStore, PostgresPool, QuestStore};
use ascend_types::{
    CharacterId, QuestDefinition, QuestInstance, QuestInstanceId, QuestStatus, Recurrence,
};

use crate::error::EngineError;

/// Summary of one assignment sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignmentSummary {
    /// Characters the sweep visited.
    pub characters: u64,
    /// Instances created.
    pub assigned: u64,
    /// Instances skipped because a pending one already existed today.
    pub deduplicated: u64,
    /// Characters skipped because their transaction failed.
    pub failed: u64,
}

/// Instantiates recurring quest definitions for every character.
pub struct AssignmentSweep {
    pool: PgPool,
}

impl AssignmentSweep {
    /// Create a sweep backed by the given pool.
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.inner().clone(),
        }
    }

    /// Assign every active auto-assign definition with the given
    /// recurrence to every character.
    ///
    /// Each character runs in its own transaction; a failure is logged and
    /// the sweep moves on, so one broken character cannot block the rest.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Db`] when the definition or character
    /// listing itself fails. Per-character failures are counted in the
    /// summary instead.
    pub async fn assign_recurring(
        &self,
        recurrence: Recurrence,
        now: DateTime<Utc>,
    ) -> Result<AssignmentSummary, EngineError> {
        let quests = QuestStore::new(&self.pool);
        let characters = CharacterStore::new(&self.pool);

        let definitions = quests.auto_assign_definitions(recurrence).await?;
        if definitions.is_empty() {
            return Ok(AssignmentSummary::default());
        }
        let character_ids = characters.list_character_ids().await?;

        let mut summary = AssignmentSummary::default();
        for character_id in character_ids {
            summary.characters = summary.characters.saturating_add(1);
            match self
                .assign_for_character(&quests, character_id, &definitions, now)
                .await
            {
                Ok((assigned, deduplicated)) => {
                    summary.assigned = summary.assigned.saturating_add(assigned);
                    summary.deduplicated = summary.deduplicated.saturating_add(deduplicated);
                }
                Err(err) => {
                    summary.failed = summary.failed.saturating_add(1);
                    warn!(
                        character_id = %character_id,
                        error = %err,
                        "assignment failed for character, skipping"
                    );
                }
            }
        }

        info!(
            recurrence = recurrence.as_str(),
            characters = summary.characters,
            assigned = summary.assigned,
            deduplicated = summary.deduplicated,
            failed = summary.failed,
            "assignment sweep finished"
        );
        Ok(summary)
    }

    /// Assign all due definitions to one character in one transaction.
    async fn assign_for_character(
        &self,
        quests: &QuestStore<'_>,
        character_id: CharacterId,
        definitions: &[QuestDefinition],
        now: DateTime<Utc>,
    ) -> Result<(u64, u64), EngineError> {
        let today = now.date_naive();
        let mut tx = self.pool.begin().await?;
        let mut assigned = 0u64;
        let mut deduplicated = 0u64;

        for definition in definitions {
            if quests
                .has_pending_assigned_on(&mut tx, character_id, definition.id, today)
                .await?
            {
                deduplicated = deduplicated.saturating_add(1);
                continue;
            }

            let instance = QuestInstance {
                id: QuestInstanceId::new(),
                character_id,
                quest_definition_id: definition.id,
                status: QuestStatus::Pending,
                assigned_at: now,
                deadline: Some(deadline_for(definition, now)),
                completed_at: None,
                failed_at: None,
                expired_at: None,
            };
            quests.insert_instance(&mut tx, &instance).await?;
            assigned = assigned.saturating_add(1);
        }

        tx.commit().await?;
        Ok((assigned, deduplicated))
    }
}

/// Deadline for an instance assigned at `now`: the definition's explicit
/// hour window when set, otherwise the end of the assignment day.
fn deadline_for(definition: &QuestDefinition, now: DateTime<Utc>) -> DateTime<Utc> {
    match definition.deadline_hours {
        Some(hours) => now
            .checked_add_signed(Duration::hours(i64::from(hours)))
            .unwrap_or(now),
        None => end_of_day(now),
    }
}

/// The last second of `now`'s UTC calendar day.
fn end_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveTime::from_hms_opt(23, 59, 59).map_or(now, |t| {
        DateTime::from_naive_utc_and_offset(now.date_naive().and_time(t), Utc)
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::TimeZone;

    use ascend_types::QuestDefinitionId;

    use super::*;

    fn definition(deadline_hours: Option<u32>) -> QuestDefinition {
        QuestDefinition {
            id: QuestDefinitionId::new(),
            title: "Morning run".to_owned(),
            description: String::new(),
            base_xp: 50,
            difficulty_multiplier: 1.0,
            is_mandatory: false,
            recurrence: Recurrence::Daily,
            auto_assign: true,
            deadline_hours,
            completion_count: 0,
            is_active: true,
            stat_effects: vec![],
        }
    }

    #[test]
    fn explicit_deadline_window_is_honored() {
        let now = Utc.with_ymd_and_hms(2026, 8, 29, 9, 30, 0).single().unwrap();
        let deadline = deadline_for(&definition(Some(6)), now);
        assert_eq!(
            deadline,
            Utc.with_ymd_and_hms(2026, 8, 29, 15, 30, 0).single().unwrap()
        );
    }

    #[test]
    fn default_deadline_is_end_of_assignment_day() {
        let now = Utc.with_ymd_and_hms(2026, 8, 29, 9, 30, 0).single().unwrap();
        let deadline = deadline_for(&definition(None), now);
        assert_eq!(
            deadline,
            Utc.with_ymd_and_hms(2026, 8, 29, 23, 59, 59).single().unwrap()
        );
    }
}
