//! Transactional quest resolution.
//!
//! [`QuestResolutionService`] is the single entry point for completing and
//! failing quests. Each operation runs in one `PostgreSQL` transaction:
//!
//! 1. Lock the quest instance (`FOR UPDATE`) and verify it is `Pending`.
//! 2. Lock the character aggregate and load the unlock candidates.
//! 3. Run the pure resolution logic from `ascend-progression`.
//! 4. Persist every implied mutation: character, stats, newly unlocked
//!    stats, instance state, audit entries, system messages, streaks, and
//!    the day's fatigue snapshot.
//! 5. Commit.
//!
//! Two concurrent resolutions for the same character serialize on the row
//! locks; the loser re-reads the instance and sees a terminal status, so a
//! quest can never be resolved twice.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::info;

use ascend_db::{CharacterStore, FatigueStore, HistoryStore, PostgresPool, QuestStore, StreakStore};
use ascend_progression::{
    AuditEntry, Notice, StatEntry, StreakTransition, apply_completion, fatigue_ratio,
    resolve_completion, resolve_failure,
};
use ascend_types::{
    CharacterId, CharacterStat, CharacterStatId, FatigueLog, FatigueLogId, ProgressLog,
    ProgressLogId, QuestInstanceId, QuestOutcome, QuestStatus, Recurrence, Streak, StreakCadence,
    StreakId, SystemMessage,
};

use crate::error::EngineError;

/// Orchestrates quest completion and failure.
pub struct QuestResolutionService {
    pool: PgPool,
}

impl QuestResolutionService {
    /// Create a service backed by the given pool.
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.inner().clone(),
        }
    }

    /// Complete a pending quest instance for a character.
    ///
    /// Returns the outcome summary (XP gained, level changes, stat
    /// changes, and the user-facing message).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::QuestNotFound`] when the instance does not
    /// exist for this character, [`EngineError::NotPending`] when it has
    /// already been resolved, and [`EngineError::Db`] /
    /// [`EngineError::Progression`] on persistence or computation failure.
    pub async fn complete_quest(
        &self,
        character_id: CharacterId,
        instance_id: QuestInstanceId,
        now: DateTime<Utc>,
    ) -> Result<QuestOutcome, EngineError> {
        let quests = QuestStore::new(&self.pool);
        let characters = CharacterStore::new(&self.pool);
        let history = HistoryStore::new(&self.pool);
        let streaks = StreakStore::new(&self.pool);
        let fatigue = FatigueStore::new(&self.pool);

        let mut tx = self.pool.begin().await?;

        let (instance, definition) = quests
            .load_instance_for_update(&mut tx, instance_id, character_id)
            .await?
            .ok_or(EngineError::QuestNotFound)?;
        if instance.status != QuestStatus::Pending {
            return Err(EngineError::NotPending {
                status: instance.status,
            });
        }

        let aggregate = characters
            .load_aggregate_for_update(&mut tx, character_id)
            .await?
            .ok_or(EngineError::CharacterNotFound)?;
        let candidates = characters.unlock_candidates(&mut tx, character_id).await?;

        let mut character = aggregate.character;
        let mut entries: Vec<StatEntry> = aggregate
            .stats
            .into_iter()
            .map(|(stat, definition)| StatEntry { stat, definition })
            .collect();

        let resolution = resolve_completion(
            &mut character,
            &mut entries,
            &definition,
            instance_id,
            &candidates,
            now,
        )?;

        // Persist the mutated aggregate. Only stats the resolution touched
        // carry this transaction's timestamp.
        characters.save_character(&mut tx, &character).await?;
        for entry in entries.iter().filter(|e| e.stat.updated_at == now) {
            characters.save_stat(&mut tx, &entry.stat).await?;
        }
        for def in &resolution.unlocked {
            let stat = CharacterStat {
                id: CharacterStatId::new(),
                character_id,
                stat_definition_id: def.id,
                // New stats start at zero, clamped into the definition's range.
                current_value: 0.0_f64.clamp(def.min_value, def.max_value),
                last_used_at: None,
                last_decayed_on: None,
                updated_at: now,
            };
            characters.insert_stat(&mut tx, &stat).await?;
        }

        quests.mark_completed(&mut tx, instance_id, now).await?;
        quests
            .increment_completion_count(&mut tx, definition.id)
            .await?;

        append_history(&history, &mut tx, character_id, &resolution.audit, now).await?;
        append_notices(&history, &mut tx, character_id, &resolution.notices, now).await?;

        // Streaks: the daily streak counts every completion; the weekly
        // streak additionally counts completions of weekly quests.
        let today = now.date_naive();
        update_streak(
            &streaks,
            &mut tx,
            character_id,
            StreakCadence::Daily,
            today,
            now,
        )
        .await?;
        if definition.recurrence == Recurrence::Weekly {
            update_streak(
                &streaks,
                &mut tx,
                character_id,
                StreakCadence::Weekly,
                today,
                now,
            )
            .await?;
        }

        // Fatigue snapshot: recount the day now that this completion is
        // visible inside the transaction.
        let (completed, assigned) = quests.day_counts(&mut tx, character_id, today).await?;
        record_fatigue(&fatigue, &mut tx, character_id, today, completed, assigned, now).await?;

        tx.commit().await?;

        info!(
            character_id = %character_id,
            instance_id = %instance_id,
            xp_gained = resolution.outcome.xp_gained,
            leveled_up = resolution.outcome.leveled_up,
            unlocked = resolution.unlocked.len(),
            "quest completed"
        );
        Ok(resolution.outcome)
    }

    /// Fail a pending quest instance for a character.
    ///
    /// Applies the discipline penalty and records the failure; mandatory
    /// failures are flagged in the audit metadata.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::QuestNotFound`] when the instance does not
    /// exist for this character, [`EngineError::NotPending`] when it has
    /// already been resolved, and [`EngineError::Db`] on persistence
    /// failure.
    pub async fn fail_quest(
        &self,
        character_id: CharacterId,
        instance_id: QuestInstanceId,
        now: DateTime<Utc>,
    ) -> Result<QuestOutcome, EngineError> {
        let quests = QuestStore::new(&self.pool);
        let characters = CharacterStore::new(&self.pool);
        let history = HistoryStore::new(&self.pool);

        let mut tx = self.pool.begin().await?;

        let (instance, definition) = quests
            .load_instance_for_update(&mut tx, instance_id, character_id)
            .await?
            .ok_or(EngineError::QuestNotFound)?;
        if instance.status != QuestStatus::Pending {
            return Err(EngineError::NotPending {
                status: instance.status,
            });
        }

        let aggregate = characters
            .load_aggregate_for_update(&mut tx, character_id)
            .await?
            .ok_or(EngineError::CharacterNotFound)?;

        let mut character = aggregate.character;
        let mut entries: Vec<StatEntry> = aggregate
            .stats
            .into_iter()
            .map(|(stat, definition)| StatEntry { stat, definition })
            .collect();

        let resolution =
            resolve_failure(&mut character, &mut entries, &definition, instance_id, now);

        characters.save_character(&mut tx, &character).await?;
        for entry in entries.iter().filter(|e| e.stat.updated_at == now) {
            characters.save_stat(&mut tx, &entry.stat).await?;
        }

        quests.mark_failed(&mut tx, instance_id, now).await?;

        append_history(&history, &mut tx, character_id, &resolution.audit, now).await?;
        append_notices(&history, &mut tx, character_id, &resolution.notices, now).await?;

        tx.commit().await?;

        info!(
            character_id = %character_id,
            instance_id = %instance_id,
            is_mandatory = definition.is_mandatory,
            "quest failed"
        );
        Ok(resolution.outcome)
    }
}

// ---------------------------------------------------------------------------
// Shared persistence helpers
// ---------------------------------------------------------------------------

/// Append audit entries as progress-log rows.
async fn append_history(
    history: &HistoryStore<'_>,
    conn: &mut PgConnection,
    character_id: CharacterId,
    entries: &[AuditEntry],
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    for entry in entries {
        let log = ProgressLog {
            id: ProgressLogId::new(),
            character_id,
            quest_instance_id: entry.quest_instance_id,
            kind: entry.kind,
            xp_change: entry.xp_change,
            level_before: entry.level_before,
            level_after: entry.level_after,
            metadata: entry.metadata.clone(),
            created_at: now,
        };
        history.append_progress(conn, &log).await?;
    }
    Ok(())
}

/// Deliver notices as system messages.
async fn append_notices(
    history: &HistoryStore<'_>,
    conn: &mut PgConnection,
    character_id: CharacterId,
    notices: &[Notice],
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    for notice in notices {
        let message = SystemMessage::new(character_id, notice.kind, notice.content.clone(), now);
        history.append_message(conn, &message).await?;
    }
    Ok(())
}

/// Apply a completion to one cadence's streak record.
async fn update_streak(
    streaks: &StreakStore<'_>,
    conn: &mut PgConnection,
    character_id: CharacterId,
    cadence: StreakCadence,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    let existing = streaks.get_for_update(conn, character_id, cadence).await?;
    let update = apply_completion(existing.as_ref(), today);
    if update.transition == StreakTransition::AlreadyCountedToday {
        return Ok(());
    }

    let streak = Streak {
        id: existing.as_ref().map_or_else(StreakId::new, |s| s.id),
        character_id,
        cadence,
        current_streak: update.current_streak,
        longest_streak: update.longest_streak,
        last_completed_on: Some(update.last_completed_on),
        updated_at: now,
    };
    streaks.upsert(conn, &streak).await?;
    Ok(())
}

/// Upsert the day's fatigue snapshot from fresh quest counts.
async fn record_fatigue(
    fatigue: &FatigueStore<'_>,
    conn: &mut PgConnection,
    character_id: CharacterId,
    day: NaiveDate,
    completed: u32,
    assigned: u32,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    let log = FatigueLog {
        id: FatigueLogId::new(),
        character_id,
        date: day,
        quests_completed: completed,
        quests_assigned: assigned,
        fatigue_level: fatigue_ratio(completed, assigned),
        created_at: now,
    };
    fatigue.upsert(conn, &log).await?;
    Ok(())
}
