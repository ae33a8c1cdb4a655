//! Character aggregate persistence.
//!
//! The character aggregate (the character row plus its stats joined with
//! their definitions) is the unit of consistency for quest resolution and
//! the decay sweep. Loads for mutation take row locks (`FOR UPDATE`) inside
//! a caller-owned transaction, so per-character operations serialize while
//! different characters proceed in parallel.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use ascend_types::{
    Character, CharacterId, CharacterStat, CharacterStatId, StatCategory, StatDefinition,
    StatDefinitionId,
};

use crate::error::DbError;

/// A character with all of its stats, loaded under row locks.
#[derive(Debug, Clone)]
pub struct CharacterAggregate {
    /// The character row.
    pub character: Character,
    /// Every stat instance paired with its catalog definition.
    pub stats: Vec<(CharacterStat, StatDefinition)>,
}

/// Convert a non-negative database INT into a domain `u32`.
fn u32_from(column: &'static str, value: i32) -> Result<u32, DbError> {
    u32::try_from(value).map_err(|_| DbError::OutOfRange { column })
}

/// Convert a domain `u32` into a database INT.
fn i32_from(column: &'static str, value: u32) -> Result<i32, DbError> {
    i32::try_from(value).map_err(|_| DbError::OutOfRange { column })
}

#[derive(sqlx::FromRow)]
struct CharacterRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    level: i32,
    current_xp: i64,
    total_xp: i64,
    available_stat_points: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CharacterRow> for Character {
    type Error = DbError;

    fn try_from(row: CharacterRow) -> Result<Self, DbError> {
        Ok(Self {
            id: row.id.into(),
            user_id: row.user_id.into(),
            name: row.name,
            level: u32_from("characters.level", row.level)?,
            current_xp: row.current_xp,
            total_xp: row.total_xp,
            available_stat_points: u32_from(
                "characters.available_stat_points",
                row.available_stat_points,
            )?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StatJoinRow {
    id: Uuid,
    character_id: Uuid,
    stat_definition_id: Uuid,
    current_value: f64,
    last_used_at: Option<DateTime<Utc>>,
    last_decayed_on: Option<NaiveDate>,
    updated_at: DateTime<Utc>,
    name: String,
    category: String,
    description: String,
    min_value: f64,
    max_value: f64,
    decay_rate: f64,
    unlock_level: i32,
    is_active: bool,
}

impl TryFrom<StatJoinRow> for (CharacterStat, StatDefinition) {
    type Error = DbError;

    fn try_from(row: StatJoinRow) -> Result<Self, DbError> {
        let category = StatCategory::parse(&row.category).ok_or_else(|| DbError::InvalidEnum {
            column: "stat_definitions.category",
            value: row.category.clone(),
        })?;
        let stat = CharacterStat {
            id: CharacterStatId::from(row.id),
            character_id: CharacterId::from(row.character_id),
            stat_definition_id: StatDefinitionId::from(row.stat_definition_id),
            current_value: row.current_value,
            last_used_at: row.last_used_at,
            last_decayed_on: row.last_decayed_on,
            updated_at: row.updated_at,
        };
        let definition = StatDefinition {
            id: StatDefinitionId::from(row.stat_definition_id),
            name: row.name,
            category,
            description: row.description,
            min_value: row.min_value,
            max_value: row.max_value,
            decay_rate: row.decay_rate,
            unlock_level: u32_from("stat_definitions.unlock_level", row.unlock_level)?,
            is_active: row.is_active,
        };
        Ok((stat, definition))
    }
}

#[derive(sqlx::FromRow)]
struct DefinitionRow {
    id: Uuid,
    name: String,
    category: String,
    description: String,
    min_value: f64,
    max_value: f64,
    decay_rate: f64,
    unlock_level: i32,
    is_active: bool,
}

impl TryFrom<DefinitionRow> for StatDefinition {
    type Error = DbError;

    fn try_from(row: DefinitionRow) -> Result<Self, DbError> {
        let category = StatCategory::parse(&row.category).ok_or_else(|| DbError::InvalidEnum {
            column: "stat_definitions.category",
            value: row.category.clone(),
        })?;
        Ok(Self {
            id: StatDefinitionId::from(row.id),
            name: row.name,
            category,
            description: row.description,
            min_value: row.min_value,
            max_value: row.max_value,
            decay_rate: row.decay_rate,
            unlock_level: u32_from("stat_definitions.unlock_level", row.unlock_level)?,
            is_active: row.is_active,
        })
    }
}

/// Operations on the `characters` and `character_stats` tables.
pub struct CharacterStore<'a> {
    pool: &'a PgPool,
}

impl<'a> CharacterStore<'a> {
    /// Create a new store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load a character and its stats under `FOR UPDATE` row locks.
    ///
    /// Must be called inside a transaction; the locks serialize all other
    /// resolutions and sweeps touching the same character until commit.
    /// Returns `None` when the character does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure.
    pub async fn load_aggregate_for_update(
        &self,
        conn: &mut PgConnection,
        character_id: CharacterId,
    ) -> Result<Option<CharacterAggregate>, DbError> {
        let row = sqlx::query_as::<_, CharacterRow>(
            r"SELECT id, user_id, name, level, current_xp, total_xp, available_stat_points,
                     created_at, updated_at
              FROM characters
              WHERE id = $1
              FOR UPDATE",
        )
        .bind(character_id.into_inner())
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let character = Character::try_from(row)?;

        let stat_rows = sqlx::query_as::<_, StatJoinRow>(
            r"SELECT cs.id, cs.character_id, cs.stat_definition_id, cs.current_value,
                     cs.last_used_at, cs.last_decayed_on, cs.updated_at,
                     sd.name, sd.category, sd.description, sd.min_value, sd.max_value,
                     sd.decay_rate, sd.unlock_level, sd.is_active
              FROM character_stats cs
              JOIN stat_definitions sd ON sd.id = cs.stat_definition_id
              WHERE cs.character_id = $1
              ORDER BY sd.name
              FOR UPDATE OF cs",
        )
        .bind(character_id.into_inner())
        .fetch_all(&mut *conn)
        .await?;

        let stats = stat_rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(CharacterAggregate { character, stats }))
    }

    /// Persist a character's mutable progression fields.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure, or
    /// [`DbError::OutOfRange`] if a counter no longer fits its column.
    pub async fn save_character(
        &self,
        conn: &mut PgConnection,
        character: &Character,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"UPDATE characters
              SET level = $2, current_xp = $3, total_xp = $4,
                  available_stat_points = $5, updated_at = $6
              WHERE id = $1",
        )
        .bind(character.id.into_inner())
        .bind(i32_from("characters.level", character.level)?)
        .bind(character.current_xp)
        .bind(character.total_xp)
        .bind(i32_from(
            "characters.available_stat_points",
            character.available_stat_points,
        )?)
        .bind(character.updated_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Persist a stat instance's mutable fields.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure.
    pub async fn save_stat(
        &self,
        conn: &mut PgConnection,
        stat: &CharacterStat,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"UPDATE character_stats
              SET current_value = $2, last_used_at = $3, last_decayed_on = $4, updated_at = $5
              WHERE id = $1",
        )
        .bind(stat.id.into_inner())
        .bind(stat.current_value)
        .bind(stat.last_used_at)
        .bind(stat.last_decayed_on)
        .bind(stat.updated_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Create a stat instance for a newly unlocked definition.
    ///
    /// `ON CONFLICT DO NOTHING` keeps the (character, definition)
    /// uniqueness invariant even under a racing unlock.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure.
    pub async fn insert_stat(
        &self,
        conn: &mut PgConnection,
        stat: &CharacterStat,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO character_stats
                  (id, character_id, stat_definition_id, current_value,
                   last_used_at, last_decayed_on, updated_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7)
              ON CONFLICT (character_id, stat_definition_id) DO NOTHING",
        )
        .bind(stat.id.into_inner())
        .bind(stat.character_id.into_inner())
        .bind(stat.stat_definition_id.into_inner())
        .bind(stat.current_value)
        .bind(stat.last_used_at)
        .bind(stat.last_decayed_on)
        .bind(stat.updated_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Active stat definitions the character has not instantiated yet.
    ///
    /// These are the unlock candidates a level-up filters by unlock level.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure.
    pub async fn unlock_candidates(
        &self,
        conn: &mut PgConnection,
        character_id: CharacterId,
    ) -> Result<Vec<StatDefinition>, DbError> {
        let rows = sqlx::query_as::<_, DefinitionRow>(
            r"SELECT id, name, category, description, min_value, max_value,
                     decay_rate, unlock_level, is_active
              FROM stat_definitions sd
              WHERE sd.is_active
                AND NOT EXISTS (
                    SELECT 1 FROM character_stats cs
                    WHERE cs.character_id = $1 AND cs.stat_definition_id = sd.id
                )
              ORDER BY sd.unlock_level, sd.name",
        )
        .bind(character_id.into_inner())
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Every character ID, for the daily sweeps.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] on query failure.
    pub async fn list_character_ids(&self) -> Result<Vec<CharacterId>, DbError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(r"SELECT id FROM characters ORDER BY id")
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| CharacterId::from(id)).collect())
    }
}
