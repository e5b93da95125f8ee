//! Error types for webime-core.
//!
//! Only configuration-time and storage failures are reported as `Err`.
//! Dictionary load failures during a rebuild are collected as
//! [`LoadWarning`](crate::loader::LoadWarning)s instead, and an empty lookup is
//! simply an empty candidate list.

use std::path::PathBuf;

/// Errors produced by the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse dictionary '{dictionary}': {message}")]
    Parse { dictionary: String, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid fuzzy rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("search backend failed: {0}")]
    Backend(String),

    #[error("usage storage error: {0}")]
    Storage(String),

    #[error("compiled dictionary cache error: {0}")]
    Cache(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<redb::Error> for Error {
    fn from(e: redb::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<redb::DatabaseError> for Error {
    fn from(e: redb::DatabaseError) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<redb::TransactionError> for Error {
    fn from(e: redb::TransactionError) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<redb::TableError> for Error {
    fn from(e: redb::TableError) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<redb::StorageError> for Error {
    fn from(e: redb::StorageError) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<redb::CommitError> for Error {
    fn from(e: redb::CommitError) -> Self {
        Error::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
