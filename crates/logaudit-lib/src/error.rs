use std::path::PathBuf;
use thiserror::Error;

/// Problems with a single log line.
///
/// These never escape the tracker: each one is turned into exactly one
/// info-level diagnostic and processing continues with the next line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    /// Line did not split into `timestamp,description,action,pid`
    #[error("expected 4 comma-separated fields, found {found}")]
    FieldCount { found: usize },

    /// Timestamp field is not a `HH:MM:SS` time of day
    #[error("invalid timestamp '{value}'")]
    InvalidTimestamp { value: String },

    /// START for a PID that already has an open session
    #[error("Duplicate detected: 2 applications running under same PID - {pid}")]
    DuplicateStart { pid: String },

    /// END for a PID with no open session
    #[error("PID ended, but never started - {pid}")]
    EndWithoutStart { pid: String },

    /// Action field is neither START nor END
    #[error("Action not START or END")]
    InvalidAction { action: String },

    /// END timestamp is earlier than the START it closes
    #[error(
        "END at {end} precedes START at {start} for PID - {pid} (midnight crossing is unsupported)"
    )]
    EndBeforeStart {
        pid: String,
        start: String,
        end: String,
    },
}

impl LineError {
    /// Whether this is a parse failure rather than a protocol violation
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            LineError::FieldCount { .. } | LineError::InvalidTimestamp { .. }
        )
    }
}

/// Errors that end the processing of a whole file.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Path is missing or is not a regular file
    #[error("File path does not exist or is not a file: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O error while opening or reading a log file
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AuditError {
    /// Create a new I/O error for the given path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Path of the file that failed
    pub fn path(&self) -> &std::path::Path {
        match self {
            AuditError::FileNotFound(path) => path,
            AuditError::Io { path, .. } => path,
        }
    }
}

/// Result type for file-level audit operations
pub type AuditResult<T> = Result<T, AuditError>;
