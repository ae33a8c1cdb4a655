//! Error types for the orchestration layer.

use ascend_db::DbError;
use ascend_progression::ProgressionError;
use ascend_types::QuestStatus;

/// Errors that can occur while orchestrating a progression operation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The quest instance does not exist or belongs to another character.
    #[error("quest instance not found")]
    QuestNotFound,

    /// The character does not exist.
    #[error("character not found")]
    CharacterNotFound,

    /// The quest instance has already reached a terminal state.
    #[error("quest instance is not pending (status: {})", .status.as_str())]
    NotPending {
        /// The instance's current status.
        status: QuestStatus,
    },

    /// A data-layer operation failed.
    #[error("database error: {0}")]
    Db(#[from] DbError),

    /// A progression computation failed.
    #[error("progression error: {0}")]
    Progression(#[from] ProgressionError),
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        Self::Db(DbError::Postgres(err))
    }
}
