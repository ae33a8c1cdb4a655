//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity in the progression engine has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time. All IDs use UUID v7
//! (time-ordered) for efficient database indexing. The `new()` constructors
//! exist for app-side generation (resolution services, tests, seed data).

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a user account (owned by the external auth layer).
    UserId
}

define_id! {
    /// Unique identifier for a character.
    CharacterId
}

define_id! {
    /// Unique identifier for a stat definition (the attribute catalog).
    StatDefinitionId
}

define_id! {
    /// Unique identifier for one character's instance of a stat.
    CharacterStatId
}

define_id! {
    /// Unique identifier for a quest definition (the reusable template).
    QuestDefinitionId
}

define_id! {
    /// Unique identifier for one assignment of a quest to a character.
    QuestInstanceId
}

define_id! {
    /// Unique identifier for a streak record.
    StreakId
}

define_id! {
    /// Unique identifier for a per-day fatigue log row.
    FatigueLogId
}

define_id! {
    /// Unique identifier for an append-only progress log entry.
    ProgressLogId
}

define_id! {
    /// Unique identifier for a user-facing system message.
    SystemMessageId
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types_with_distinct_values() {
        let a = CharacterId::new();
        let b = CharacterId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn id_round_trips_through_uuid() {
        let id = QuestInstanceId::new();
        let raw: Uuid = id.into();
        assert_eq!(QuestInstanceId::from(raw), id);
        assert_eq!(id.into_inner(), raw);
    }

    #[test]
    fn id_serializes_as_plain_uuid() {
        let id = CharacterId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0));
    }
}
