use thiserror::Error;

use crate::config::ConfigError;

/// Error type for lenient parsing of raw dive log fields.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldParseError {
    #[error("parse error at position {position}: {message}")]
    Invalid { position: usize, message: String },

    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error("empty value")]
    Empty,
}

/// Error raised by a dive log store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store operation aborted")]
    Aborted,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Error returned by the dive log auditor.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("dive log {log_id} not found for user {user_id}")]
    NotFound { user_id: String, log_id: String },

    #[error("upstream store failure: {0}")]
    Upstream(#[from] StoreError),

    #[error("invalid audit configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}
