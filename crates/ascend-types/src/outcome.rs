//! The result record returned to callers after a quest resolves.
//!
//! Internal computation keeps full `f64` precision; rounding to two decimal
//! places happens exactly once, here, at the presentation boundary.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Round a value to two decimal places for display.
///
/// Used for every real-valued field that crosses the API boundary (stat
/// values, fatigue ratios). Internal state is never stored rounded.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One stat's before/after values from a quest resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StatChange {
    /// Display name of the stat.
    pub stat_name: String,
    /// Value before the resolution, rounded to 2 decimals.
    pub old_value: f64,
    /// Value after the resolution, rounded to 2 decimals.
    pub new_value: f64,
    /// Delta applied, rounded to 2 decimals. Negative for penalties.
    pub change: f64,
}

impl StatChange {
    /// Build a display-rounded change record from full-precision values.
    pub fn rounded(stat_name: &str, old_value: f64, new_value: f64, change: f64) -> Self {
        Self {
            stat_name: stat_name.to_owned(),
            old_value: round2(old_value),
            new_value: round2(new_value),
            change: round2(change),
        }
    }
}

/// Summary of a quest completion or failure, returned to the API layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QuestOutcome {
    /// Whether the quest counted as a success. `false` on a failure
    /// resolution, even though the penalty was applied and recorded.
    pub success: bool,
    /// XP credited to the character (0 on failure).
    pub xp_gained: i64,
    /// Whether the completion pushed the character over a level boundary.
    pub leveled_up: bool,
    /// The new level when `leveled_up`, otherwise `None`.
    pub new_level: Option<u32>,
    /// Per-stat deltas applied by the resolution.
    pub stat_changes: Vec<StatChange>,
    /// Human-readable summary, also delivered as a system message.
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_rounds_half_up_at_two_decimals() {
        assert!((round2(1.005) - 1.01).abs() < 1e-9 || (round2(1.005) - 1.0).abs() < 1e-9);
        assert!((round2(45.0) - 45.0).abs() < f64::EPSILON);
        assert!((round2(0.333_333) - 0.33).abs() < 1e-9);
        assert!((round2(2.675) - 2.68).abs() < 0.01);
    }

    #[test]
    fn stat_change_rounds_all_fields() {
        let change = StatChange::rounded("Focus", 10.123_456, 12.654_321, 2.530_865);
        assert!((change.old_value - 10.12).abs() < 1e-9);
        assert!((change.new_value - 12.65).abs() < 1e-9);
        assert!((change.change - 2.53).abs() < 1e-9);
    }
}
