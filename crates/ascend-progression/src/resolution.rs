//! Pure quest-resolution logic.
//!
//! Given the loaded state a resolution touches (character, stats, the quest
//! definition, and the unlockable stat catalog), these functions compute
//! every mutation a completion or failure implies: XP and level deltas,
//! stat gains or penalties, newly unlocked stats, audit entries, and
//! user-facing notices. The orchestration layer applies the result inside a
//! single transaction; nothing here performs I/O.

use chrono::{DateTime, Utc};
use serde_json::json;

use ascend_types::{
    Character, CharacterStat, MessageKind, ProgressEventKind, QuestDefinition, QuestInstanceId,
    QuestOutcome, StatChange, StatDefinition,
};

use crate::error::ProgressionError;
use crate::formulas::{cumulative_xp_for_level, earned_xp, level_from_total_xp, stat_gain};

/// Fatigue passed into the XP formula on the completion path.
///
/// The live fatigue ratio is computed and persisted after every completion
/// but is deliberately not threaded into the XP discount yet; completions
/// always earn undiscounted XP. Wiring the live ratio in is a one-line
/// change here.
pub const FATIGUE_ON_COMPLETION: f64 = 0.0;

/// Fixed stat penalty applied to the discipline stat when a quest fails.
pub const FAILURE_PENALTY_POINTS: f64 = 2.0;

/// Name of the stat that absorbs failure penalties.
pub const DISCIPLINE_STAT_NAME: &str = "Discipline";

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// One of a character's stats paired with its definition.
#[derive(Debug, Clone, PartialEq)]
pub struct StatEntry {
    /// The character's mutable stat instance.
    pub stat: CharacterStat,
    /// The catalog definition (bounds, decay rate, name).
    pub definition: StatDefinition,
}

/// An audit-trail entry to append. The data layer assigns the row identity.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    /// The quest instance involved, when the event has one.
    pub quest_instance_id: Option<QuestInstanceId>,
    /// What happened.
    pub kind: ProgressEventKind,
    /// XP delta carried by the event.
    pub xp_change: i64,
    /// Level before the event, when relevant.
    pub level_before: Option<u32>,
    /// Level after the event, when relevant.
    pub level_after: Option<u32>,
    /// Event-specific details.
    pub metadata: Option<serde_json::Value>,
}

/// A user-facing notice to deliver as a system message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Message category.
    pub kind: MessageKind,
    /// Message body.
    pub content: String,
}

/// Everything a completion implies, ready for the data layer to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResolution {
    /// The summary returned to the caller.
    pub outcome: QuestOutcome,
    /// Level before the completion.
    pub old_level: u32,
    /// Levels gained (0 when no level-up occurred).
    pub levels_gained: u32,
    /// Stat definitions newly unlocked by the level-up, to be created as
    /// zero-valued character stats.
    pub unlocked: Vec<StatDefinition>,
    /// Audit entries to append.
    pub audit: Vec<AuditEntry>,
    /// Notices to deliver.
    pub notices: Vec<Notice>,
}

/// Everything a failure implies.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureResolution {
    /// The summary returned to the caller.
    pub outcome: QuestOutcome,
    /// Audit entries to append.
    pub audit: Vec<AuditEntry>,
    /// Notices to deliver.
    pub notices: Vec<Notice>,
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// Resolve a quest completion against in-memory state.
///
/// Mutates `character` and `stats` to their post-completion values and
/// returns the full mutation record. The caller has already verified the
/// instance is `Pending` and belongs to this character.
///
/// # Order of operations
///
/// 1. Compute earned XP (difficulty applied, fatigue fixed at
///    [`FATIGUE_ON_COMPLETION`]).
/// 2. Apply stat gains for every effect with a matching unlocked stat,
///    clamped to each stat's maximum; effects for locked stats are skipped.
/// 3. Credit XP, derive the new level, and on level-up grant stat points
///    and collect newly eligible stat definitions.
/// 4. Build the audit entries (completion, plus a dedicated level-up entry)
///    and notices.
///
/// # Errors
///
/// Returns [`ProgressionError::ArithmeticOverflow`] if an XP total or the
/// stat-point counter would overflow.
pub fn resolve_completion(
    character: &mut Character,
    stats: &mut [StatEntry],
    definition: &QuestDefinition,
    instance_id: QuestInstanceId,
    unlock_candidates: &[StatDefinition],
    now: DateTime<Utc>,
) -> Result<CompletionResolution, ProgressionError> {
    let earned = earned_xp(
        definition.base_xp,
        definition.difficulty_multiplier,
        FATIGUE_ON_COMPLETION,
    );
    let old_level = character.level;

    // 2. Stat gains. Effects naming a stat the character has not unlocked
    // yet are silently skipped.
    let mut stat_changes: Vec<StatChange> = Vec::new();
    for effect in &definition.stat_effects {
        let Some(entry) = stats
            .iter_mut()
            .find(|e| e.stat.stat_definition_id == effect.stat_definition_id)
        else {
            continue;
        };

        let old_value = entry.stat.current_value;
        let gain = stat_gain(definition.base_xp, effect.effect_multiplier);
        entry.stat.current_value = (old_value + gain).min(entry.definition.max_value);
        entry.stat.last_used_at = Some(now);
        entry.stat.updated_at = now;

        stat_changes.push(StatChange::rounded(
            &entry.definition.name,
            old_value,
            entry.stat.current_value,
            gain,
        ));
    }

    // 3. XP credit and level derivation.
    character.total_xp = character.total_xp.checked_add(earned).ok_or_else(|| {
        ProgressionError::ArithmeticOverflow {
            context: "total_xp credit".to_owned(),
        }
    })?;
    character.current_xp = character.current_xp.checked_add(earned).ok_or_else(|| {
        ProgressionError::ArithmeticOverflow {
            context: "current_xp credit".to_owned(),
        }
    })?;

    let new_level = level_from_total_xp(character.total_xp);
    let leveled_up = new_level > old_level;
    let mut levels_gained = 0;
    let mut unlocked: Vec<StatDefinition> = Vec::new();

    if leveled_up {
        levels_gained = new_level.saturating_sub(old_level);
        character.level = new_level;
        character.current_xp = character
            .total_xp
            .checked_sub(cumulative_xp_for_level(new_level))
            .ok_or_else(|| ProgressionError::ArithmeticOverflow {
                context: "current_xp rebase after level-up".to_owned(),
            })?;
        character.available_stat_points = character
            .available_stat_points
            .checked_add(levels_gained)
            .ok_or_else(|| ProgressionError::ArithmeticOverflow {
                context: "stat point grant".to_owned(),
            })?;

        // Newly eligible definitions: unlock level crossed by this jump,
        // active, and not already instantiated for the character.
        unlocked = unlock_candidates
            .iter()
            .filter(|def| {
                def.is_active
                    && def.unlock_level > old_level
                    && def.unlock_level <= new_level
                    && !stats
                        .iter()
                        .any(|e| e.stat.stat_definition_id == def.id)
            })
            .cloned()
            .collect();
    }
    character.updated_at = now;

    // 4. Audit trail and notices.
    let mut audit = vec![AuditEntry {
        quest_instance_id: Some(instance_id),
        kind: ProgressEventKind::QuestComplete,
        xp_change: earned,
        level_before: Some(old_level),
        level_after: Some(character.level),
        metadata: Some(json!({
            "quest_title": definition.title,
            "stat_changes": stat_changes,
        })),
    }];

    let content = if leveled_up {
        audit.push(AuditEntry {
            quest_instance_id: None,
            kind: ProgressEventKind::LevelUp,
            xp_change: 0,
            level_before: Some(old_level),
            level_after: Some(new_level),
            metadata: None,
        });
        format!(
            "Quest '{}' completed!\n+{} XP\nLevel Up! {} -> {}",
            definition.title, earned, old_level, new_level
        )
    } else {
        format!("Quest '{}' completed!\n+{} XP", definition.title, earned)
    };

    let mut notices = vec![Notice {
        kind: if leveled_up {
            MessageKind::LevelUp
        } else {
            MessageKind::Achievement
        },
        content: content.clone(),
    }];
    for def in &unlocked {
        notices.push(Notice {
            kind: MessageKind::StatUnlock,
            content: format!("New stat unlocked: {}\n{}", def.name, def.description),
        });
    }

    Ok(CompletionResolution {
        outcome: QuestOutcome {
            success: true,
            xp_gained: earned,
            leveled_up,
            new_level: leveled_up.then_some(new_level),
            stat_changes,
            message: Some(content),
        },
        old_level,
        levels_gained,
        unlocked,
        audit,
        notices,
    })
}

// ---------------------------------------------------------------------------
// Failure
// ---------------------------------------------------------------------------

/// Resolve a quest failure against in-memory state.
///
/// Applies the fixed [`FAILURE_PENALTY_POINTS`] penalty to the discipline
/// stat when the character has it, floored at the stat's minimum. Mandatory
/// failures are flagged in the audit metadata for the external
/// penalty-quest assigner; this engine does not assign the penalty quest.
pub fn resolve_failure(
    character: &mut Character,
    stats: &mut [StatEntry],
    definition: &QuestDefinition,
    instance_id: QuestInstanceId,
    now: DateTime<Utc>,
) -> FailureResolution {
    let mut stat_changes: Vec<StatChange> = Vec::new();

    if let Some(entry) = stats
        .iter_mut()
        .find(|e| e.definition.name == DISCIPLINE_STAT_NAME)
    {
        let old_value = entry.stat.current_value;
        entry.stat.current_value =
            (old_value - FAILURE_PENALTY_POINTS).max(entry.definition.min_value);
        entry.stat.updated_at = now;

        stat_changes.push(StatChange::rounded(
            DISCIPLINE_STAT_NAME,
            old_value,
            entry.stat.current_value,
            -FAILURE_PENALTY_POINTS,
        ));
    }
    character.updated_at = now;

    let audit = vec![AuditEntry {
        quest_instance_id: Some(instance_id),
        kind: ProgressEventKind::QuestFail,
        xp_change: 0,
        level_before: None,
        level_after: None,
        metadata: Some(json!({
            "quest_title": definition.title,
            "is_mandatory": definition.is_mandatory,
            "stat_changes": stat_changes,
        })),
    }];

    let mut content = format!(
        "Quest '{}' failed.\n{} -{FAILURE_PENALTY_POINTS}",
        definition.title, DISCIPLINE_STAT_NAME
    );
    if definition.is_mandatory {
        content.push_str("\nA penalty quest will be assigned.");
    }

    let notices = vec![Notice {
        kind: MessageKind::QuestFail,
        content: content.clone(),
    }];

    FailureResolution {
        outcome: QuestOutcome {
            success: false,
            xp_gained: 0,
            leveled_up: false,
            new_level: None,
            stat_changes,
            message: Some(content),
        },
        audit,
        notices,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::TimeZone;

    use ascend_types::{
        CharacterId, CharacterStatId, QuestDefinitionId, QuestStatEffect, StatCategory,
        StatDefinitionId, UserId,
    };

    use crate::formulas::xp_required_for_level;

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 29, 12, 0, 0).single().unwrap()
    }

    fn character(level: u32, total_xp: i64) -> Character {
        let now = fixed_now();
        Character {
            id: CharacterId::new(),
            user_id: UserId::new(),
            name: "Tester".to_owned(),
            level,
            current_xp: total_xp - cumulative_xp_for_level(level),
            total_xp,
            available_stat_points: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn stat_definition(name: &str, unlock_level: u32) -> StatDefinition {
        StatDefinition {
            id: StatDefinitionId::new(),
            name: name.to_owned(),
            category: StatCategory::Behavioral,
            description: format!("{name} description"),
            min_value: 0.0,
            max_value: 100.0,
            decay_rate: 0.02,
            unlock_level,
            is_active: true,
        }
    }

    fn stat_entry(definition: StatDefinition, value: f64) -> StatEntry {
        let stat = CharacterStat {
            id: CharacterStatId::new(),
            character_id: CharacterId::new(),
            stat_definition_id: definition.id,
            current_value: value,
            last_used_at: None,
            last_decayed_on: None,
            updated_at: fixed_now(),
        };
        StatEntry { stat, definition }
    }

    fn quest(base_xp: i64, effects: Vec<QuestStatEffect>) -> QuestDefinition {
        QuestDefinition {
            id: QuestDefinitionId::new(),
            title: "Morning run".to_owned(),
            description: "Run 5k before 8am".to_owned(),
            base_xp,
            difficulty_multiplier: 1.0,
            is_mandatory: false,
            recurrence: ascend_types::Recurrence::Daily,
            auto_assign: true,
            deadline_hours: None,
            completion_count: 0,
            is_active: true,
            stat_effects: effects,
        }
    }

    #[test]
    fn completion_credits_xp_and_levels_up() {
        // Level 1 character completes a 300-XP quest: cumulative XP for
        // level 2 is 282, for level 3 is 801, so the result is level 2
        // with 18 XP of overflow and one stat point granted.
        let mut ch = character(1, 0);
        let def = quest(300, vec![]);
        let res = resolve_completion(
            &mut ch,
            &mut [],
            &def,
            QuestInstanceId::new(),
            &[],
            fixed_now(),
        )
        .unwrap();

        assert_eq!(res.outcome.xp_gained, 300);
        assert!(res.outcome.leveled_up);
        assert_eq!(res.outcome.new_level, Some(2));
        assert_eq!(ch.level, 2);
        assert_eq!(ch.total_xp, 300);
        assert_eq!(ch.current_xp, 300 - 282);
        assert_eq!(ch.available_stat_points, 1);
        assert_eq!(res.levels_gained, 1);
        // Completion audit entry plus the dedicated level-up entry.
        assert_eq!(res.audit.len(), 2);
        assert_eq!(res.audit[1].kind, ProgressEventKind::LevelUp);
        assert_eq!(res.notices[0].kind, MessageKind::LevelUp);
    }

    #[test]
    fn completion_without_level_up() {
        let mut ch = character(1, 0);
        let def = quest(100, vec![]);
        let res = resolve_completion(
            &mut ch,
            &mut [],
            &def,
            QuestInstanceId::new(),
            &[],
            fixed_now(),
        )
        .unwrap();

        assert!(!res.outcome.leveled_up);
        assert_eq!(res.outcome.new_level, None);
        assert_eq!(ch.level, 1);
        assert_eq!(ch.current_xp, 100);
        assert_eq!(ch.available_stat_points, 0);
        assert_eq!(res.audit.len(), 1);
        assert_eq!(res.notices[0].kind, MessageKind::Achievement);
    }

    #[test]
    fn stat_gains_apply_and_clamp_at_max() {
        let mut ch = character(1, 0);
        let discipline = stat_definition(DISCIPLINE_STAT_NAME, 1);
        let focus = stat_definition("Focus", 1);
        let effects = vec![
            QuestStatEffect {
                stat_definition_id: discipline.id,
                effect_multiplier: 1.0,
            },
            QuestStatEffect {
                stat_definition_id: focus.id,
                effect_multiplier: 1.0,
            },
        ];
        let mut stats = [
            stat_entry(discipline, 10.0),
            stat_entry(focus, 98.0),
        ];
        let def = quest(100, effects);
        let now = fixed_now();
        let res = resolve_completion(
            &mut ch,
            &mut stats,
            &def,
            QuestInstanceId::new(),
            &[],
            now,
        )
        .unwrap();

        // stat_gain(100, 1.0) = 10: discipline 10 -> 20, focus clamps at 100.
        assert!((stats[0].stat.current_value - 20.0).abs() < f64::EPSILON);
        assert!((stats[1].stat.current_value - 100.0).abs() < f64::EPSILON);
        assert_eq!(stats[0].stat.last_used_at, Some(now));
        assert_eq!(res.outcome.stat_changes.len(), 2);
        assert!((res.outcome.stat_changes[1].new_value - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn effects_for_locked_stats_are_skipped() {
        let mut ch = character(1, 0);
        let locked = stat_definition("Creativity", 5);
        let def = quest(
            100,
            vec![QuestStatEffect {
                stat_definition_id: locked.id,
                effect_multiplier: 1.0,
            }],
        );
        let res = resolve_completion(
            &mut ch,
            &mut [],
            &def,
            QuestInstanceId::new(),
            &[],
            fixed_now(),
        )
        .unwrap();
        assert!(res.outcome.stat_changes.is_empty());
    }

    #[test]
    fn multi_level_jump_unlocks_intermediate_definitions() {
        // Enough XP to jump from level 1 straight past level 3.
        let big = xp_required_for_level(2)
            + xp_required_for_level(3)
            + xp_required_for_level(4);
        let mut ch = character(1, 0);
        let def = quest(big, vec![]);
        let at_two = stat_definition("Creativity", 2);
        let at_four = stat_definition("Charisma", 4);
        let at_nine = stat_definition("Leadership", 9);
        let candidates = vec![at_two.clone(), at_four.clone(), at_nine];

        let res = resolve_completion(
            &mut ch,
            &mut [],
            &def,
            QuestInstanceId::new(),
            &candidates,
            fixed_now(),
        )
        .unwrap();

        assert_eq!(ch.level, 4);
        assert_eq!(res.levels_gained, 3);
        assert_eq!(ch.available_stat_points, 3);
        let names: Vec<&str> = res.unlocked.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Creativity", "Charisma"]);
        // One unlock notice per new stat, after the completion notice.
        assert_eq!(res.notices.len(), 3);
        assert!(res.notices.iter().skip(1).all(|n| n.kind == MessageKind::StatUnlock));
    }

    #[test]
    fn already_held_definitions_are_not_unlocked_twice() {
        let big = xp_required_for_level(2);
        let mut ch = character(1, 0);
        let def = quest(big, vec![]);
        let held = stat_definition("Creativity", 2);
        let mut stats = [stat_entry(held.clone(), 5.0)];
        let res = resolve_completion(
            &mut ch,
            &mut stats,
            &def,
            QuestInstanceId::new(),
            std::slice::from_ref(&held),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(ch.level, 2);
        assert!(res.unlocked.is_empty());
    }

    #[test]
    fn failure_penalizes_discipline_with_floor() {
        let mut ch = character(3, 1000);
        let discipline = stat_definition(DISCIPLINE_STAT_NAME, 1);
        let mut stats = [stat_entry(discipline, 1.2)];
        let def = quest(100, vec![]);
        let res = resolve_failure(
            &mut ch,
            &mut stats,
            &def,
            QuestInstanceId::new(),
            fixed_now(),
        );

        // 1.2 - 2.0 floors at the stat minimum of 0.
        assert!((stats[0].stat.current_value).abs() < f64::EPSILON);
        assert_eq!(res.outcome.xp_gained, 0);
        assert!(!res.outcome.leveled_up);
        assert_eq!(res.outcome.stat_changes.len(), 1);
        assert_eq!(res.audit[0].kind, ProgressEventKind::QuestFail);
        // Failure must not move last_used_at: penalties are not "use".
        assert_eq!(stats[0].stat.last_used_at, None);
    }

    #[test]
    fn mandatory_failure_is_flagged_in_audit_metadata() {
        let mut ch = character(1, 0);
        let mut def = quest(100, vec![]);
        def.is_mandatory = true;
        let res = resolve_failure(
            &mut ch,
            &mut [],
            &def,
            QuestInstanceId::new(),
            fixed_now(),
        );
        let metadata = res.audit[0].metadata.as_ref().unwrap();
        assert_eq!(metadata["is_mandatory"], serde_json::Value::Bool(true));
        assert!(
            res.outcome
                .message
                .as_deref()
                .unwrap()
                .contains("penalty quest")
        );
    }

    #[test]
    fn failure_without_discipline_stat_changes_nothing() {
        let mut ch = character(1, 0);
        let def = quest(100, vec![]);
        let res = resolve_failure(
            &mut ch,
            &mut [],
            &def,
            QuestInstanceId::new(),
            fixed_now(),
        );
        assert!(res.outcome.stat_changes.is_empty());
        assert_eq!(res.outcome.xp_gained, 0);
    }
}
