//! The same-day fatigue ratio.
//!
//! Fatigue models diminishing returns within a day: the more quests a
//! character has tackled relative to what was assigned, the steeper the XP
//! discount on the *next* completion. The ratio is derived purely from the
//! day's completed/assigned counts and feeds
//! [`earned_xp`](crate::formulas::earned_xp) as its `fatigue` argument.

use serde::{Deserialize, Serialize};

use crate::formulas::MAX_FATIGUE;

/// Divisor headroom in the fatigue formula.
///
/// Completions are measured against 150% of the assigned count, so fatigue
/// saturates only once completions exceed 1.5x assignments (quests assigned
/// but not yet attempted keep the ratio below the cap).
pub const ASSIGNMENT_HEADROOM: f64 = 1.5;

/// Fatigue ratio for a day's quest counts, in `[0, MAX_FATIGUE]`.
///
/// Zero when nothing was assigned; otherwise
/// `min(MAX_FATIGUE, completed / (assigned * ASSIGNMENT_HEADROOM))`.
pub fn fatigue_ratio(completed_today: u32, assigned_today: u32) -> f64 {
    if assigned_today == 0 {
        return 0.0;
    }
    let ratio = f64::from(completed_today) / (f64::from(assigned_today) * ASSIGNMENT_HEADROOM);
    ratio.min(MAX_FATIGUE)
}

/// Coarse fatigue bands for presentation and pacing recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FatigueBand {
    /// Below 0.3: full steam ahead.
    Fresh,
    /// 0.3 to 0.6: XP returns are noticeably reduced.
    Tiring,
    /// Above 0.6: close to the cap; rest is recommended.
    Exhausted,
}

impl FatigueBand {
    /// Classify a fatigue ratio into a band.
    pub const fn from_ratio(ratio: f64) -> Self {
        if ratio < 0.3 {
            Self::Fresh
        } else if ratio < 0.6 {
            Self::Tiring
        } else {
            Self::Exhausted
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
    fn no_assignments_means_no_fatigue() {
        assert!((fatigue_ratio(0, 0)).abs() < f64::EPSILON);
        assert!((fatigue_ratio(5, 0)).abs() < f64::EPSILON);
    }

    #[test]
    fn fatigue_caps_at_max() {
        // 3 / (2 * 1.5) = 1.0, capped at 0.8
        assert!((fatigue_ratio(3, 2) - MAX_FATIGUE).abs() < f64::EPSILON);
        assert!((fatigue_ratio(100, 1) - MAX_FATIGUE).abs() < f64::EPSILON);
    }

    #[test]
    fn fatigue_below_cap_is_proportional() {
        // 1 / (2 * 1.5) = 0.333...
        assert!((fatigue_ratio(1, 2) - 1.0 / 3.0).abs() < 1e-12);
        // 1 / (4 * 1.5) = 0.1666...
        assert!((fatigue_ratio(1, 4) - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn bands_cover_the_range() {
        assert_eq!(FatigueBand::from_ratio(0.0), FatigueBand::Fresh);
        assert_eq!(FatigueBand::from_ratio(0.29), FatigueBand::Fresh);
        assert_eq!(FatigueBand::from_ratio(0.3), FatigueBand::Tiring);
        assert_eq!(FatigueBand::from_ratio(0.59), FatigueBand::Tiring);
        assert_eq!(FatigueBand::from_ratio(0.6), FatigueBand::Exhausted);
        assert_eq!(FatigueBand::from_ratio(MAX_FATIGUE), FatigueBand::Exhausted);
    }
}
