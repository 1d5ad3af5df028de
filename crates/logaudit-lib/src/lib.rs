//! Session tracking for batch-job logs.
//!
//! Each log file is a sequence of `HH:MM:SS,<description>,<START|END>,<pid>`
//! lines. A [`SessionTracker`] pairs START and END lines per PID, reports
//! sessions that ran for five minutes or more, and turns every anomaly it
//! meets (duplicate START, END without START, unknown action, malformed
//! line, unterminated session) into a [`DiagnosticRecord`] for a
//! [`DiagnosticSink`].

pub mod error;
pub mod parser;
pub mod sink;
pub mod tracker;
pub mod types;

pub use error::{AuditError, AuditResult, LineError};
pub use parser::{parse_line, strip_line_ending};
pub use sink::{DiagnosticSink, FanoutSink, FileSink, MemorySink, TracingSink};
pub use tracker::{track_lines, OpenSession, SessionTracker};
pub use types::{Action, DiagnosticRecord, DurationClass, LogLine, Severity, MIN10, MIN5};
