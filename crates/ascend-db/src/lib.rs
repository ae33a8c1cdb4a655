//! Data layer for the Ascend progression engine (`PostgreSQL`).
//!
//! All persistent state lives in `PostgreSQL`: characters and their stats,
//! the quest catalog and per-character quest instances, streaks, daily
//! fatigue snapshots, and the append-only progress history. Quest resolution
//! runs inside a single transaction with `FOR UPDATE` row locks so two
//! concurrent completions for the same character serialize instead of
//! double-crediting XP.
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool, configuration, migrations
//! - [`character_store`] -- Character + stat aggregate loading and updates
//! - [`quest_store`] -- Quest definitions, instances, and day counts
//! - [`streak_store`] -- Streak rows and the stale-streak reset sweep
//! - [`fatigue_store`] -- Per-day fatigue snapshots
//! - [`history_store`] -- Progress log and system message persistence
//! - [`seed`] -- Default stat catalog seeding
//! - [`error`] -- Shared error types

pub mod character_store;
pub mod error;
pub mod fatigue_store;
pub mod history_store;
pub mod postgres;
pub mod quest_store;
pub mod seed;
pub mod streak_store;

// Re-export primary types for convenience.
pub use character_store::{CharacterAggregate, CharacterStore};
pub use error::DbError;
pub use fatigue_store::FatigueStore;
pub use history_store::HistoryStore;
pub use postgres::{PostgresConfig, PostgresPool};
pub use quest_store::QuestStore;
pub use seed::seed_default_stats;
pub use streak_store::StreakStore;
