//! Orchestration layer for the Ascend progression engine.
//!
//! `ascend-progression` computes what a mutation would be; this crate makes
//! it so. Every operation runs inside a single `PostgreSQL` transaction
//! with `FOR UPDATE` row locks on the character aggregate, so concurrent
//! operations on the same character serialize while different characters
//! proceed in parallel.
//!
//! # Services
//!
//! - [`resolution`] -- Quest completion and failure
//! - [`assignment`] -- The recurring-quest assignment sweep
//! - [`decay`] -- The daily stat-decay sweep
//! - [`upkeep`] -- Quest expiry and stale-streak resets
//! - [`fatigue`] -- The per-day fatigue read path
//! - [`error`] -- Shared error types

pub mod assignment;
pub mod decay;
pub mod error;
pub mod fatigue;
pub mod resolution;
pub mod upkeep;

// Re-export primary types for convenience.
pub use assignment::{AssignmentSummary, AssignmentSweep};
pub use decay::{DecaySummary, DecaySweep};
pub use error::EngineError;
pub use fatigue::{FatigueService, FatigueStatus};
pub use resolution::QuestResolutionService;
pub use upkeep::UpkeepService;
