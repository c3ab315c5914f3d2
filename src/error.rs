//! Error taxonomy for the config generator.
//!
//! Library stages return these typed errors so the orchestrator can tell
//! which stage of a notification failed. Binary-level code wraps them in
//! `anyhow` instead.

use crate::control::OsFamily;
use thiserror::Error;

/// A control-file line that cannot become a directive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: expected {expected} pipe-delimited fields, found {found}")]
    MalformedRecord {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: unknown {field} value '{value}'")]
    UnknownEnumValue {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Storage-boundary failures reported by an `ObjectStore`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object '{key}' not found in '{container}'")]
    ObjectNotFound { container: String, key: String },

    #[error("object '{key}' in '{container}' is empty")]
    ObjectEmpty { container: String, key: String },

    #[error("storage backend failure on '{container}/{key}': {source}")]
    Backend {
        container: String,
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// The baseline document for an OS family could not be loaded.
#[derive(Debug, Error)]
pub enum BaselineError {
    #[error("baseline for {os} unavailable (key '{key}'): {reason}")]
    Unavailable {
        os: OsFamily,
        key: String,
        reason: String,
    },
}

/// A baseline is structurally incompatible with a directive's target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("{os} baseline: expected an object at '{path}', found {found}")]
    InvalidBaselineShape {
        os: OsFamily,
        path: String,
        found: &'static str,
    },
}

/// Pipeline stage at which a notification failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Parse,
    Merge,
    Write,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Parse => "parse",
            Stage::Merge => "merge",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

/// Failure of a single notification, tagged by stage.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("failed to fetch control file: {0}")]
    Fetch(#[source] StorageError),

    #[error("failed to parse control file: {0}")]
    Parse(#[from] ParseError),

    #[error("control file '{container}/{key}' is empty")]
    EmptyControl { container: String, key: String },

    #[error(transparent)]
    Baseline(#[from] BaselineError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("failed to serialize resolved config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write resolved config: {0}")]
    Write(#[source] StorageError),
}

impl NotificationError {
    /// Stage this error terminates.
    ///
    /// Baseline loading and serialization both happen between PARSED and
    /// MERGED, so they count as merge-stage failures.
    pub fn stage(&self) -> Stage {
        match self {
            NotificationError::Fetch(_) => Stage::Fetch,
            NotificationError::Parse(_) | NotificationError::EmptyControl { .. } => Stage::Parse,
            NotificationError::Baseline(_)
            | NotificationError::Merge(_)
            | NotificationError::Serialize(_) => Stage::Merge,
            NotificationError::Write(_) => Stage::Write,
        }
    }
}

/// Summary error for a batch with at least one failed notification.
#[derive(Debug, Error)]
#[error("{failed} of {total} notification(s) failed; first failure on '{first_source}': {first_error}")]
pub struct BatchError {
    pub failed: usize,
    pub total: usize,
    pub first_source: String,
    pub first_error: String,
}
