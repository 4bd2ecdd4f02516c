//! Error types for history reconstruction and replay.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors that abort a reconstruction or replay.
///
/// Every variant is fatal: a pass that returns one produced no usable output.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed history record at line {line}: {reason}")]
    MalformedHistoryRecord { line: usize, reason: String },

    #[error("malformed directory diff line: {line:?}")]
    MalformedDiffLine { line: String },

    #[error("no version of '{path}' exists before {before}")]
    LineageNotFound { path: String, before: NaiveDateTime },

    #[error("cleartool query failed")]
    Command(#[from] crate::cleartool::Error),

    #[error("git error")]
    Git(#[from] crate::git::Error),

    #[error("failed to read config file '{path}'")]
    ReadConfig {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file")]
    ParseConfig(#[from] toml::de::Error),

    #[error("grouping window must be a positive number of seconds, got {secs}")]
    InvalidWindow { secs: i64 },

    #[error("failed to copy '{path}'")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
