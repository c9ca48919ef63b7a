//! Error types for the store, extraction, and pipeline layers.

use std::fmt;

/// Errors surfaced by the mentionable store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The identity tuple `(value, username, room_name, mention_time)` already
    /// exists. Recoverable: under at-least-once delivery the caller drops the
    /// redelivered record.
    Duplicate(String),
    /// A `get` by identity tuple matched nothing.
    NotFound,
    /// Transient storage fault. The caller may retry with backoff; a failed
    /// write leaves no partial state.
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Duplicate(detail) => write!(f, "duplicate record: {}", detail),
            StoreError::NotFound => write!(f, "record not found"),
            StoreError::Unavailable(detail) => write!(f, "store unavailable: {}", detail),
        }
    }
}

impl std::error::Error for StoreError {}

impl StoreError {
    /// Map a Diesel error from a write path. Unique-constraint violations are
    /// the duplicate-identity signal; everything else is a transient fault.
    pub fn from_write(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};
        match err {
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::Duplicate(info.message().to_string())
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }

    /// Map a Diesel error from a read path.
    pub fn from_read(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => StoreError::NotFound,
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Errors raised by an extraction stage for a single message.
///
/// Never fatal to the pipeline: the message is skipped for that stage only and
/// the other stages still run.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// The inbound message cannot be classified or is missing required
    /// metadata (e.g. empty username or room name).
    Malformed(String),
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::Malformed(detail) => write!(f, "malformed message: {}", detail),
        }
    }
}

impl std::error::Error for ExtractionError {}

/// Failure of the injected entity-recognition capability.
///
/// Treated as zero entities extracted for that message, not a pipeline fault.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizerError(pub String);

impl fmt::Display for RecognizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "recognizer failure: {}", self.0)
    }
}

impl std::error::Error for RecognizerError {}
