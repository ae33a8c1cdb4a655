//! Error types for the scheduler binary.

/// Errors that can occur while starting or running the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for RunnerError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}
