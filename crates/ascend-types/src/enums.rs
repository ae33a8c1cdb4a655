//! Closed enumeration types for the Ascend data model.
//!
//! The original data model leaned on string-typed categories; here every
//! category is a closed enum so branching logic (decay skips, message
//! routing, fatigue thresholds) is exhaustiveness-checked at compile time.
//! Each enum carries an `as_str` / `parse` pair for the TEXT columns the
//! data layer stores them in.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Quest lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle state of a quest instance.
///
/// `Pending` is the only non-terminal state. Once an instance reaches
/// `Completed`, `Failed`, or `Expired` it never transitions again; the
/// resolution services reject any attempt to re-resolve a terminal instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum QuestStatus {
    /// Assigned and awaiting completion or failure.
    Pending,
    /// Completed by the character; XP and stat gains were applied.
    Completed,
    /// Explicitly failed by the character; the discipline penalty applied.
    Failed,
    /// The deadline passed without resolution.
    Expired,
}

impl QuestStatus {
    /// Database TEXT representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Expired => "expired",
        }
    }

    /// Parse the database TEXT representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    /// Whether this status is terminal (no further transitions allowed).
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

// ---------------------------------------------------------------------------
// Streak cadence
// ---------------------------------------------------------------------------

/// The cadence a streak counts consecutive completions over.
///
/// Each character holds at most one streak record per cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum StreakCadence {
    /// Consecutive calendar days with at least one completion.
    Daily,
    /// Consecutive weeks, driven by weekly-recurring quests.
    Weekly,
}

impl StreakCadence {
    /// Database TEXT representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    /// Parse the database TEXT representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Quest recurrence
// ---------------------------------------------------------------------------

/// How often a quest definition recurs for auto-assignment.
///
/// Recurrence is trigger metadata for the assignment sweep; it has no
/// effect on the XP or stat math of an individual completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Recurrence {
    /// A one-off quest, assigned manually.
    OneOff,
    /// Re-assigned every day by the daily sweep.
    Daily,
    /// Re-assigned every week by the weekly sweep.
    Weekly,
}

impl Recurrence {
    /// Database TEXT representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneOff => "one_off",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    /// Parse the database TEXT representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "one_off" => Some(Self::OneOff),
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Stat categories
// ---------------------------------------------------------------------------

/// Category a stat definition belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum StatCategory {
    /// Body: strength, stamina, agility.
    Physical,
    /// Mind: focus, intelligence, creativity.
    Mental,
    /// Habits: discipline, willpower, consistency.
    Behavioral,
    /// People: charisma, leadership, empathy.
    Social,
}

impl StatCategory {
    /// Database TEXT representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Mental => "mental",
            Self::Behavioral => "behavioral",
            Self::Social => "social",
        }
    }

    /// Parse the database TEXT representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "physical" => Some(Self::Physical),
            "mental" => Some(Self::Mental),
            "behavioral" => Some(Self::Behavioral),
            "social" => Some(Self::Social),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Progress log event kinds
// ---------------------------------------------------------------------------

/// The kind of event an append-only progress log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ProgressEventKind {
    /// A quest was completed; XP and stat gains applied.
    QuestComplete,
    /// A quest was failed; the discipline penalty applied.
    QuestFail,
    /// A pending quest passed its deadline and expired unresolved.
    QuestExpired,
    /// The character's level increased.
    LevelUp,
    /// A stat value changed outside quest resolution (manual allocation).
    StatChange,
    /// A penalty quest was assigned after a mandatory failure.
    PenaltyAssigned,
    /// A stat lost value to daily decay.
    StatDecay,
}

impl ProgressEventKind {
    /// Database TEXT representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QuestComplete => "quest_complete",
            Self::QuestFail => "quest_fail",
            Self::QuestExpired => "quest_expired",
            Self::LevelUp => "level_up",
            Self::StatChange => "stat_change",
            Self::PenaltyAssigned => "penalty_assigned",
            Self::StatDecay => "stat_decay",
        }
    }

    /// Parse the database TEXT representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "quest_complete" => Some(Self::QuestComplete),
            "quest_fail" => Some(Self::QuestFail),
            "quest_expired" => Some(Self::QuestExpired),
            "level_up" => Some(Self::LevelUp),
            "stat_change" => Some(Self::StatChange),
            "penalty_assigned" => Some(Self::PenaltyAssigned),
            "stat_decay" => Some(Self::StatDecay),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// System message kinds
// ---------------------------------------------------------------------------

/// The kind of a user-facing system message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum MessageKind {
    /// A quest was completed without a level-up.
    Achievement,
    /// A quest completion triggered a level-up.
    LevelUp,
    /// A quest was failed.
    QuestFail,
    /// A new stat became available to the character.
    StatUnlock,
    /// A warning, e.g. significant stat decay.
    Warning,
}

impl MessageKind {
    /// Database TEXT representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Achievement => "achievement",
            Self::LevelUp => "level_up",
            Self::QuestFail => "quest_fail",
            Self::StatUnlock => "stat_unlock",
            Self::Warning => "warning",
        }
    }

    /// Parse the database TEXT representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "achievement" => Some(Self::Achievement),
            "level_up" => Some(Self::LevelUp),
            "quest_fail" => Some(Self::QuestFail),
            "stat_unlock" => Some(Self::StatUnlock),
            "warning" => Some(Self::Warning),
            _ => None,
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
    fn quest_status_round_trips() {
        for status in [
            QuestStatus::Pending,
            QuestStatus::Completed,
            QuestStatus::Failed,
            QuestStatus::Expired,
        ] {
            assert_eq!(QuestStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(QuestStatus::parse("cancelled"), None);
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!QuestStatus::Pending.is_terminal());
        assert!(QuestStatus::Completed.is_terminal());
        assert!(QuestStatus::Failed.is_terminal());
        assert!(QuestStatus::Expired.is_terminal());
    }

    #[test]
    fn event_kind_round_trips() {
        for kind in [
            ProgressEventKind::QuestComplete,
            ProgressEventKind::QuestFail,
            ProgressEventKind::QuestExpired,
            ProgressEventKind::LevelUp,
            ProgressEventKind::StatChange,
            ProgressEventKind::PenaltyAssigned,
            ProgressEventKind::StatDecay,
        ] {
            assert_eq!(ProgressEventKind::parse(kind.as_str()), Some(kind));
        }
    }
}
