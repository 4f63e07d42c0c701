//! Error types for meetcal operations.

use thiserror::Error;

use crate::diff::DiffKind;

/// A feed document or entry that does not have the expected shape.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Feed is not valid XML: {0}")]
    Xml(String),

    #[error("Feed has no <channel> element")]
    MissingChannel,

    #[error("Entry '{entry}' has no <{field}>")]
    MissingField { entry: String, field: &'static str },

    #[error("Link '{0}' is not a valid URL")]
    InvalidLink(String),

    #[error("Link '{0}' has no meeting id query parameter")]
    MissingMeetingId(String),

    #[error("Title '{title}' should have 3 parts separated by ' - ', found {parts}")]
    MalformedTitle { title: String, parts: usize },

    #[error("Could not parse date '{0}'")]
    UnparseableDate(String),

    #[error("Could not parse published timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("Local time '{0}' does not exist in the feed time zone")]
    NonexistentLocalTime(String),
}

/// Identity store read/write failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store serialization error: {0}")]
    Serialization(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    #[error("Could not generate a unique record id after {0} attempts")]
    IdExhausted(usize),
}

/// Failure reported by a calendar collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct CalendarError(pub String);

/// A calendar mutation that failed while applying a plan.
#[derive(Error, Debug)]
#[error("Failed to {} event {event_id}: {source}", .kind.verb())]
pub struct ApplyError {
    pub event_id: String,
    pub kind: DiffKind,
    #[source]
    pub source: CalendarError,
}

/// Errors that can abort a sync run.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Calendar error: {0}")]
    Calendar(#[from] CalendarError),

    #[error(transparent)]
    Apply(#[from] ApplyError),
}

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
