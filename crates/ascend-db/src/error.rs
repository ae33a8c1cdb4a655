//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`sqlx`] errors with additional context about which operation failed.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A TEXT column held a value outside its closed enum set.
    #[error("Invalid enum value in column {column}: {value}")]
    InvalidEnum {
        /// The column that held the value.
        column: &'static str,
        /// The offending value.
        value: String,
    },

    /// A numeric column held a value outside the domain type's range.
    #[error("Out-of-range value in column {column}")]
    OutOfRange {
        /// The column that held the value.
        column: &'static str,
    },

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
