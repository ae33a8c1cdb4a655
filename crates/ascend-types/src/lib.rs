//! Shared type definitions for the Ascend progression engine.
//!
//! Ascend is a gamified personal-development tracker: characters complete
//! quests to earn XP, level up, grow persistent stats, and build streaks.
//! This crate holds the types every other crate agrees on: strongly-typed
//! identifiers, closed enumerations for every string-typed category in the
//! data model, the entity structs themselves, and the outcome record
//! returned to the API layer after a quest resolves.
//!
//! # Modules
//!
//! - [`ids`] -- UUID newtype wrappers, one per entity.
//! - [`enums`] -- Quest status, streak cadence, event kinds, and the other
//!   closed categories.
//! - [`entities`] -- Characters, stats, quests, streaks, fatigue logs, and
//!   audit records.
//! - [`outcome`] -- The quest-resolution summary handed back to callers,
//!   with 2-decimal display rounding.

pub mod entities;
pub mod enums;
pub mod ids;
pub mod outcome;

// Re-export primary types at crate root.
pub use entities::{
    Character, CharacterStat, FatigueLog, ProgressLog, QuestDefinition, QuestInstance,
    QuestStatEffect, StatDefinition, Streak, SystemMessage,
};
pub use enums::{
    MessageKind, ProgressEventKind, QuestStatus, Recurrence, StatCategory, StreakCadence,
};
pub use ids::{
    CharacterId, CharacterStatId, FatigueLogId, ProgressLogId, QuestDefinitionId, QuestInstanceId,
    StatDefinitionId, StreakId, SystemMessageId, UserId,
};
pub use outcome::{QuestOutcome, StatChange, round2};
