//! Error taxonomy for topic tracking
//!
//! Every variant is recoverable: callers degrade to a no-op plus a visible
//! result item instead of aborting.

use thiserror::Error;

/// Errors produced by the codec, reconciler, store and host adapters
#[derive(Debug, Error)]
pub enum TopicError {
    /// The collection already holds the maximum number of topics
    #[error("cannot add topic: maximum limit ({max}) reached")]
    CapacityExceeded { max: usize },

    /// The anchor of a topic could not be found in its document
    #[error("anchor '{token}' not found in {path}")]
    AnchorMissing { token: String, path: String },

    /// The document a topic points to does not exist
    #[error("document not found: {path}")]
    DocumentAbsent { path: String },

    /// The persisted blob could not be interpreted
    #[error("malformed persisted state: {0}")]
    MalformedPersistedState(String),

    /// A requested line range does not fit the document
    #[error("invalid line range {start}:{end} for {path} ({len} lines)")]
    InvalidRange {
        path: String,
        start: usize,
        end: usize,
        len: usize,
    },

    /// The first line of the range already anchors a live topic
    #[error("line {line} of {path} is already registered as topic {id}")]
    AlreadyRegistered {
        path: String,
        line: usize,
        id: String,
    },

    /// No topic at the requested 1-based slot
    #[error("no topic at position {position} ({len} registered)")]
    NotFound { position: usize, len: usize },

    /// Unknown setting name or unparsable value
    #[error("invalid setting {name} = '{value}'")]
    InvalidSetting { name: String, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TopicError {
    /// Stable machine-readable code used in rendered error items
    pub fn code(&self) -> &'static str {
        match self {
            TopicError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            TopicError::AnchorMissing { .. } => "ANCHOR_MISSING",
            TopicError::DocumentAbsent { .. } => "DOCUMENT_ABSENT",
            TopicError::MalformedPersistedState(_) => "MALFORMED_STATE",
            TopicError::InvalidRange { .. } => "INVALID_RANGE",
            TopicError::AlreadyRegistered { .. } => "ALREADY_REGISTERED",
            TopicError::NotFound { .. } => "NOT_FOUND",
            TopicError::InvalidSetting { .. } => "INVALID_SETTING",
            TopicError::Io(_) => "IO_ERROR",
            TopicError::Json(_) => "JSON_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, TopicError>;
