//! Default stat catalog seeding.
//!
//! Seeds the twelve launch stats on first run. A non-empty catalog is left
//! untouched, so operators can customize definitions without the seeder
//! fighting back.

use sqlx::PgPool;

use ascend_types::{StatCategory, StatDefinitionId};

use crate::error::DbError;

/// One seed row: name, category, description, decay rate, unlock level.
type SeedStat = (&'static str, StatCategory, &'static str, f64, u32);

/// The launch stat catalog. Values range 0 to 100 for every stat.
const DEFAULT_STATS: &[SeedStat] = &[
    (
        "Strength",
        StatCategory::Physical,
        "Physical power and fitness from exercise and sports",
        0.03,
        1,
    ),
    (
        "Stamina",
        StatCategory::Physical,
        "Endurance and ability to work for extended periods",
        0.025,
        1,
    ),
    (
        "Agility",
        StatCategory::Physical,
        "Speed and coordination",
        0.03,
        1,
    ),
    (
        "Focus",
        StatCategory::Mental,
        "Concentration and attention span from deep work",
        0.03,
        1,
    ),
    (
        "Intelligence",
        StatCategory::Mental,
        "Learning speed and knowledge acquisition",
        0.015,
        1,
    ),
    (
        "Creativity",
        StatCategory::Mental,
        "Innovation and problem-solving ability",
        0.02,
        5,
    ),
    (
        "Discipline",
        StatCategory::Behavioral,
        "Self-control and consistency in completing tasks",
        0.025,
        1,
    ),
    (
        "Willpower",
        StatCategory::Behavioral,
        "Resistance to procrastination and distractions",
        0.02,
        5,
    ),
    (
        "Consistency",
        StatCategory::Behavioral,
        "Ability to maintain streaks and habits",
        0.015,
        10,
    ),
    (
        "Charisma",
        StatCategory::Social,
        "Social influence and communication skills",
        0.02,
        5,
    ),
    (
        "Leadership",
        StatCategory::Social,
        "Ability to inspire and guide others",
        0.015,
        10,
    ),
    (
        "Empathy",
        StatCategory::Social,
        "Understanding and connecting with others",
        0.01,
        15,
    ),
];

/// Value bounds shared by every seeded stat.
const SEED_MIN_VALUE: f64 = 0.0;

/// Value bounds shared by every seeded stat.
const SEED_MAX_VALUE: f64 = 100.0;

/// Seed the default stat catalog when the table is empty.
///
/// Returns the number of definitions inserted (0 when the catalog already
/// has entries).
///
/// # Errors
///
/// Returns [`DbError::Postgres`] on query failure.
pub async fn seed_default_stats(pool: &PgPool) -> Result<u64, DbError> {
    let (existing,): (i64,) = sqlx::query_as(r"SELECT count(*) FROM stat_definitions")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        tracing::info!(count = existing, "stat catalog already seeded, skipping");
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;
    for (name, category, description, decay_rate, unlock_level) in DEFAULT_STATS {
        let unlock = i32::try_from(*unlock_level).map_err(|_| DbError::OutOfRange {
            column: "stat_definitions.unlock_level",
        })?;
        sqlx::query(
            r"INSERT INTO stat_definitions
                  (id, name, category, description, min_value, max_value,
                   decay_rate, unlock_level, is_active)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE)",
        )
        .bind(StatDefinitionId::new().into_inner())
        .bind(name)
        .bind(category.as_str())
        .bind(description)
        .bind(SEED_MIN_VALUE)
        .bind(SEED_MAX_VALUE)
        .bind(decay_rate)
        .bind(unlock)
        .execute(&mut *tx)
        .await?;
        inserted = inserted.saturating_add(1);
    }
    tx.commit().await?;

    tracing::info!(count = inserted, "seeded default stat catalog");
    Ok(inserted)
}
