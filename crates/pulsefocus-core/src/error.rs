//! Core error types for pulsefocus-core.
//!
//! The session state machine and sync layer are infallible by design --
//! illegal transitions are no-ops and malformed payload fields are skipped.
//! Errors exist only at the storage, configuration, and coaching boundaries.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pulsefocus-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Coaching-service errors
    #[error("Coach error: {0}")]
    Coach(#[from] CoachError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
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

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Coaching-service errors.
///
/// Never fatal for the session core: callers degrade to the local
/// heuristic when any of these occur.
#[derive(Error, Debug)]
pub enum CoachError {
    /// API key required but not stored
    #[error("Coach API key required but not configured")]
    MissingCredentials,

    /// Endpoint URL could not be assembled
    #[error("Invalid coach endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Transport-level failure
    #[error("Coach request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-200 response
    #[error("Coach endpoint returned HTTP {0}")]
    Status(u16),

    /// 200 response with no extractable content
    #[error("Coach response contained no content")]
    EmptyContent,
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
