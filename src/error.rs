//! The error taxonomy used throughout the indexing engine (spec §7).
//!
//! Categories are stable and deliberately small: callers match on them to decide whether a
//! failure should abort a build, skip a single file, or surface as an empty query result.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClinkError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("interrupted")]
    Interrupted,

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("invalid regular expression: {0}")]
    Regex(#[from] regex::Error),

    #[error("internal invariant broken: {0}")]
    NotRecoverable(String),
}

pub type Result<T> = std::result::Result<T, ClinkError>;

impl ClinkError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        ClinkError::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ClinkError::NotFound(msg.into())
    }
}
