//! Core entity structs for the Ascend progression engine.
//!
//! These mirror the persisted rows one-to-one. Ownership of mutation is
//! deliberately narrow: the resolution services and the decay sweep are the
//! only writers of `Character` and `CharacterStat`, streaks are written by
//! the streak tracker, and `ProgressLog` is append-only and never mutated
//! after creation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{MessageKind, ProgressEventKind, QuestStatus, Recurrence, StatCategory, StreakCadence};
use crate::ids::{
    CharacterId, CharacterStatId, FatigueLogId, ProgressLogId, QuestDefinitionId, QuestInstanceId,
    StatDefinitionId, StreakId, SystemMessageId, UserId,
};

// ---------------------------------------------------------------------------
// Character
// ---------------------------------------------------------------------------

/// A character: the progression state of one user.
///
/// Invariant: `current_xp == total_xp - cumulative_xp_for_level(level)`,
/// `total_xp` is monotone non-decreasing, and `level >= 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Character {
    /// Unique identifier.
    pub id: CharacterId,
    /// The owning user account (managed by the external auth layer).
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Current level, starting at 1.
    pub level: u32,
    /// XP accumulated since the last level-up.
    pub current_xp: i64,
    /// Lifetime XP; never decreases.
    pub total_xp: i64,
    /// Spendable stat points earned on level-up.
    pub available_stat_points: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Stat catalog
// ---------------------------------------------------------------------------

/// A named attribute category in the stat catalog (e.g. "Discipline").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StatDefinition {
    /// Unique identifier.
    pub id: StatDefinitionId,
    /// Display name; unique within the catalog.
    pub name: String,
    /// Which category the stat belongs to.
    pub category: StatCategory,
    /// Human-readable description shown on unlock.
    pub description: String,
    /// Lower bound for character stat values.
    pub min_value: f64,
    /// Upper bound for character stat values.
    pub max_value: f64,
    /// Fraction of the current value lost per elapsed day of disuse.
    pub decay_rate: f64,
    /// Character level at which this stat becomes available.
    pub unlock_level: u32,
    /// Inactive definitions are ignored by unlocking and assignment.
    pub is_active: bool,
}

/// One character's instance of a stat definition.
///
/// Created when the character first reaches the definition's unlock level;
/// at most one instance exists per (character, definition) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CharacterStat {
    /// Unique identifier.
    pub id: CharacterStatId,
    /// The owning character.
    pub character_id: CharacterId,
    /// The definition this value instantiates.
    pub stat_definition_id: StatDefinitionId,
    /// Current value, clamped to the definition's `[min, max]` range.
    pub current_value: f64,
    /// When the stat last gained value through genuine use.
    ///
    /// `None` means never used; decay treats that as one day unused.
    /// Decay itself never updates this field.
    pub last_used_at: Option<DateTime<Utc>>,
    /// Calendar day the decay sweep last touched this stat.
    ///
    /// Guards sweep idempotency: two sweeps on the same day decay once.
    pub last_decayed_on: Option<NaiveDate>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Quests
// ---------------------------------------------------------------------------

/// A stat effect attached to a quest definition: which stat the quest
/// nudges and by how much.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QuestStatEffect {
    /// The stat this quest trains.
    pub stat_definition_id: StatDefinitionId,
    /// Multiplier applied in the stat-gain formula.
    pub effect_multiplier: f64,
}

/// A reusable quest template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QuestDefinition {
    /// Unique identifier.
    pub id: QuestDefinitionId,
    /// Display title.
    pub title: String,
    /// Human-readable description.
    pub description: String,
    /// Nominal XP before difficulty and fatigue modifiers.
    pub base_xp: i64,
    /// Difficulty multiplier applied to the base XP.
    pub difficulty_multiplier: f64,
    /// Mandatory quests carry heavier failure consequences.
    pub is_mandatory: bool,
    /// Auto-assignment cadence.
    pub recurrence: Recurrence,
    /// Whether the assignment sweep instantiates this definition.
    pub auto_assign: bool,
    /// Hours from assignment to deadline; `None` means end of the
    /// assignment day.
    pub deadline_hours: Option<u32>,
    /// Lifetime number of completed instances.
    pub completion_count: u64,
    /// Inactive definitions are never assigned.
    pub is_active: bool,
    /// The stats this quest trains.
    pub stat_effects: Vec<QuestStatEffect>,
}

/// One assignment of a quest definition to a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QuestInstance {
    /// Unique identifier.
    pub id: QuestInstanceId,
    /// The assigned character.
    pub character_id: CharacterId,
    /// The template this instance was created from.
    pub quest_definition_id: QuestDefinitionId,
    /// Lifecycle state. Terminal states are never left.
    pub status: QuestStatus,
    /// When the instance was assigned.
    pub assigned_at: DateTime<Utc>,
    /// When the instance expires if unresolved.
    pub deadline: Option<DateTime<Utc>>,
    /// Set when the instance reaches `Completed`.
    pub completed_at: Option<DateTime<Utc>>,
    /// Set when the instance reaches `Failed`.
    pub failed_at: Option<DateTime<Utc>>,
    /// Set when the instance reaches `Expired`.
    pub expired_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Streaks and fatigue
// ---------------------------------------------------------------------------

/// Consecutive-completion counter for one character and cadence.
///
/// Invariant: `longest_streak >= current_streak`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Streak {
    /// Unique identifier.
    pub id: StreakId,
    /// The owning character.
    pub character_id: CharacterId,
    /// Which cadence this streak counts.
    pub cadence: StreakCadence,
    /// Length of the streak currently running; 0 when broken by inactivity.
    pub current_streak: u32,
    /// Historical maximum of `current_streak`; never decreases.
    pub longest_streak: u32,
    /// Calendar day of the most recent qualifying completion.
    pub last_completed_on: Option<NaiveDate>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Per-character, per-day quest counts used to derive the fatigue ratio.
///
/// At most one row exists per (character, date) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FatigueLog {
    /// Unique identifier.
    pub id: FatigueLogId,
    /// The owning character.
    pub character_id: CharacterId,
    /// The calendar day the counts cover.
    pub date: NaiveDate,
    /// Instances completed this day.
    pub quests_completed: u32,
    /// Instances assigned this day.
    pub quests_assigned: u32,
    /// Derived fatigue ratio in `[0, 0.8]`.
    pub fatigue_level: f64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Audit trail and notifications
// ---------------------------------------------------------------------------

/// An append-only audit trail entry. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ProgressLog {
    /// Unique identifier.
    pub id: ProgressLogId,
    /// The character the event concerns.
    pub character_id: CharacterId,
    /// The quest instance involved, when the event has one.
    pub quest_instance_id: Option<QuestInstanceId>,
    /// What happened.
    pub kind: ProgressEventKind,
    /// XP delta carried by the event (0 for non-XP events).
    pub xp_change: i64,
    /// Level before the event, when relevant.
    pub level_before: Option<u32>,
    /// Level after the event, when relevant.
    pub level_after: Option<u32>,
    /// Event-specific details (quest title, stat changes, days unused).
    pub metadata: Option<serde_json::Value>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A user-facing notification produced by the progression engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SystemMessage {
    /// Unique identifier.
    pub id: SystemMessageId,
    /// The recipient character.
    pub character_id: CharacterId,
    /// Message category for presentation routing.
    pub kind: MessageKind,
    /// Message title; the engine always uses `[ SYSTEM ]`.
    pub title: String,
    /// Message body.
    pub content: String,
    /// Whether the user has read the message.
    pub is_read: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl SystemMessage {
    /// Title the engine stamps on every message it emits.
    pub const SYSTEM_TITLE: &'static str = "[ SYSTEM ]";

    /// Create an unread message for a character, timestamped `now`.
    pub fn new(
        character_id: CharacterId,
        kind: MessageKind,
        content: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SystemMessageId::new(),
            character_id,
            kind,
            title: Self::SYSTEM_TITLE.to_owned(),
            content,
            is_read: false,
            created_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_message_is_unread_and_titled() {
        let msg = SystemMessage::new(
            CharacterId::new(),
            MessageKind::Achievement,
            "Quest complete".to_owned(),
            Utc::now(),
        );
        assert!(!msg.is_read);
        assert_eq!(msg.title, "[ SYSTEM ]");
    }
}
