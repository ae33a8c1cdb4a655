//! Error types for progression computations.

/// Errors that can occur while computing progression state.
#[derive(Debug, thiserror::Error)]
pub enum ProgressionError {
    /// Integer arithmetic overflowed (XP totals, stat points).
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// What was being computed when the overflow occurred.
        context: String,
    },
}
