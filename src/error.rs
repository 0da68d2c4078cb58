use std::path::PathBuf;

use thiserror::Error as ThisError;

/// Errors that can occur while configuring or building loggers
#[derive(ThisError, Debug)]
pub enum Error {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Initialization failed.
    #[error("Initialization error: {0}")]
    Init(String),
    /// The log directory or file could not be created.
    #[error("Failed to create log target {}: {source}", path.display())]
    Materialize {
        /// Path that could not be created.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// A logger with this name is already registered.
    #[error("Logger already registered: {0:?}")]
    DuplicateLogger(String),
    /// Only named loggers can be registered.
    #[error("Cannot register a logger without a name")]
    UnnamedLogger,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
