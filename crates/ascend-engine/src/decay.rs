//! The daily stat-decay sweep.
//!
//! Walks every character, plans decay for each stat with
//! `ascend-progression`, and persists the results. Each character runs in
//! its own transaction under the same row locks quest resolution takes, so
//! a decay sweep and a completion for the same character serialize instead
//! of clobbering each other's stat values.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info, warn};

use ascend_db::{CharacterStore, HistoryStore, PostgresPool};
use ascend_progression::plan_stat_decay;
use ascend_types::{
    CharacterId, MessageKind, ProgressEventKind, ProgressLog, ProgressLogId, SystemMessage, round2,
};

use crate::error::EngineError;

/// Summary of one decay sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecaySummary {
    /// Characters the sweep visited.
    pub characters: u64,
    /// Stats that lost value.
    pub stats_decayed: u64,
    /// Warning messages delivered for significant drops.
    pub warnings: u64,
    /// Characters skipped because their transaction failed.
    pub failed: u64,
}

/// Applies daily decay to every character's unused stats.
pub struct DecaySweep {
    pool: PgPool,
}

impl DecaySweep {
    /// Create a sweep backed by the given pool.
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.inner().clone(),
        }
    }

    /// Run the sweep at a fixed `now`.
    ///
    /// Idempotent within a calendar day: stats already decayed today are
    /// skipped, so a crashed sweep can simply be re-run.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Db`] when the character listing itself
    /// fails. Per-character failures are logged and counted instead.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<DecaySummary, EngineError> {
        let characters = CharacterStore::new(&self.pool);
        let character_ids = characters.list_character_ids().await?;

        let mut summary = DecaySummary::default();
        for character_id in character_ids {
            summary.characters = summary.characters.saturating_add(1);
            match self.decay_character(&characters, character_id, now).await {
                Ok((decayed, warnings)) => {
                    summary.stats_decayed = summary.stats_decayed.saturating_add(decayed);
                    summary.warnings = summary.warnings.saturating_add(warnings);
                }
                Err(err) => {
                    summary.failed = summary.failed.saturating_add(1);
                    warn!(
                        character_id = %character_id,
                        error = %err,
                        "decay failed for character, skipping"
                    );
                }
            }
        }

        info!(
            characters = summary.characters,
            stats_decayed = summary.stats_decayed,
            warnings = summary.warnings,
            failed = summary.failed,
            "decay sweep finished"
        );
        Ok(summary)
    }

    /// Decay one character's stats in one transaction.
    async fn decay_character(
        &self,
        characters: &CharacterStore<'_>,
        character_id: CharacterId,
        now: DateTime<Utc>,
    ) -> Result<(u64, u64), EngineError> {
        let history = HistoryStore::new(&self.pool);
        let today = now.date_naive();

        let mut tx = self.pool.begin().await?;
        let Some(aggregate) = characters
            .load_aggregate_for_update(&mut tx, character_id)
            .await?
        else {
            // Deleted between the listing and the lock.
            return Ok((0, 0));
        };

        let mut decayed = 0u64;
        let mut warnings = 0u64;
        for (mut stat, definition) in aggregate.stats {
            let Some(outcome) = plan_stat_decay(&stat, &definition, now) else {
                continue;
            };

            stat.current_value = outcome.new_value;
            stat.last_decayed_on = Some(today);
            stat.updated_at = now;
            characters.save_stat(&mut tx, &stat).await?;
            decayed = decayed.saturating_add(1);

            let log = ProgressLog {
                id: ProgressLogId::new(),
                character_id,
                quest_instance_id: None,
                kind: ProgressEventKind::StatDecay,
                xp_change: 0,
                level_before: None,
                level_after: None,
                metadata: Some(serde_json::json!({
                    "stat_name": definition.name,
                    "old_value": round2(outcome.old_value),
                    "new_value": round2(outcome.new_value),
                    "days_unused": outcome.days_unused,
                })),
                created_at: now,
            };
            history.append_progress(&mut tx, &log).await?;

            if outcome.significant {
                let message = SystemMessage::new(
                    character_id,
                    MessageKind::Warning,
                    format!(
                        "{} is fading: {:.1} -> {:.1} after {} days unused.",
                        definition.name, outcome.old_value, outcome.new_value, outcome.days_unused
                    ),
                    now,
                );
                history.append_message(&mut tx, &message).await?;
                warnings = warnings.saturating_add(1);
            }

            debug!(
                character_id = %character_id,
                stat = %definition.name,
                old_value = outcome.old_value,
                new_value = outcome.new_value,
                days_unused = outcome.days_unused,
                "stat decayed"
            );
        }

        tx.commit().await?;
        Ok((decayed, warnings))
    }
}
