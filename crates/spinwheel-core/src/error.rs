//! Core error types for spinwheel-core.
//!
//! Storage and configuration faults get their own enums so the cooldown
//! engine can discard storage failures explicitly while still logging them.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for spinwheel-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Spin history store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while reading or writing the spin history file.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to read or write the backing file
    #[error("I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document could not be encoded or decoded
    #[error("Malformed history document: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored timestamp could not be interpreted
    #[error("Invalid timestamp '{value}' in field '{field}'")]
    InvalidTimestamp { field: &'static str, value: String },

    /// The temporary file could not replace the real one
    #[error("Failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Data directory could not be determined or created
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
