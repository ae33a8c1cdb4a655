//! Pure progression logic for the Ascend engine.
//!
//! Everything in this crate is deterministic over its inputs: no I/O, no
//! clocks, no randomness. Time always arrives as a parameter, which is what
//! makes replaying an audit trail and unit-testing day-boundary behavior
//! possible. The data layer and the orchestration services live elsewhere;
//! this crate only ever computes what a mutation *would* be.
//!
//! # Modules
//!
//! - [`formulas`] -- Level/XP conversion, earned XP, stat gain, stat decay.
//! - [`fatigue`] -- The bounded same-day fatigue ratio.
//! - [`streak`] -- The consecutive-completion state machine.
//! - [`decay`] -- Per-stat daily decay planning.
//! - [`resolution`] -- The full mutation set implied by completing or
//!   failing a quest.
//! - [`error`] -- Error types for progression computations.

pub mod decay;
pub mod error;
pub mod fatigue;
pub mod formulas;
pub mod resolution;
pub mod streak;

// Re-export primary types at crate root.
pub use decay::{DecayOutcome, NEVER_USED_DECAY_DAYS, SIGNIFICANT_DECAY_POINTS, plan_stat_decay};
pub use error::ProgressionError;
pub use fatigue::{FatigueBand, fatigue_ratio};
pub use formulas::{
    MAX_FATIGUE, STAT_GAIN_SCALE, cumulative_xp_for_level, earned_xp, level_from_total_xp,
    stat_decay, stat_gain, xp_required_for_level,
};
pub use resolution::{
    AuditEntry, CompletionResolution, DISCIPLINE_STAT_NAME, FAILURE_PENALTY_POINTS,
    FATIGUE_ON_COMPLETION, FailureResolution, Notice, StatEntry, resolve_completion,
    resolve_failure,
};
pub use streak::{StreakTransition, StreakUpdate, apply_completion, is_stale};
