use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration store operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The backing file does not exist and the source is not optional.
    #[error("configuration file not found at '{path}'")]
    NotFound {
        /// Path that was expected to hold the configuration document.
        path: PathBuf,
    },

    /// The document could not be parsed as a configuration tree.
    #[error("invalid configuration document: {details}")]
    Format {
        /// Parse or serialization error details.
        details: String,
    },

    /// A store parameter or key is unusable.
    #[error("invalid configuration: {details}")]
    InvalidConfiguration {
        /// Reason the parameter was rejected.
        details: String,
    },

    /// Error occurred during file I/O operations.
    #[error("I/O error on '{path}': {details}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// I/O error details.
        details: String,
    },

    /// Failed to initialize the file watcher.
    #[error("failed to initialize file watcher: {details}")]
    WatchInit {
        /// File watcher initialization error details.
        details: String,
    },

    /// Error occurred while watching the backing file.
    #[error("file watcher error for '{path}': {details}")]
    Watch {
        /// Path being watched when the error occurred.
        path: PathBuf,
        /// File watcher error details.
        details: String,
    },

    /// Error occurred while acquiring the snapshot lock.
    #[error("failed to acquire {lock_type} lock: {details}")]
    Lock {
        /// Type of lock that failed (read, write).
        lock_type: String,
        /// Lock error details.
        details: String,
    },
}

/// A specialized `Result` type for store operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
