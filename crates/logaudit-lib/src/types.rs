//! Core data types shared by the parser, the tracker and the sinks.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sessions at or above this many seconds are reported as warnings.
pub const MIN5: i64 = 5 * 60;
/// Sessions at or above this many seconds are reported as errors.
pub const MIN10: i64 = 10 * 60;

/// Action column of a log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Start,
    End,
    /// Anything else, kept verbatim (after trimming)
    Invalid(String),
}

impl Action {
    /// Parse an action field. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "START" => Action::Start,
            "END" => Action::End,
            other => Action::Invalid(other.to_string()),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Start => write!(f, "START"),
            Action::End => write!(f, "END"),
            Action::Invalid(raw) => write!(f, "{raw}"),
        }
    }
}

/// One parsed input record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub timestamp: NaiveTime,
    pub description: String,
    pub action: Action,
    pub pid: String,
}

/// Severity of a diagnostic record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Level name as written by the file sink
    pub fn as_level(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_level())
    }
}

/// Duration tier of a completed session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DurationClass {
    Normal,
    Warning,
    Error,
}

impl DurationClass {
    /// Classify an elapsed time in whole seconds.
    pub fn classify(seconds: i64) -> Self {
        if seconds >= MIN10 {
            DurationClass::Error
        } else if seconds >= MIN5 {
            DurationClass::Warning
        } else {
            DurationClass::Normal
        }
    }

    /// Severity to report for this class, `None` for normal sessions
    pub fn severity(&self) -> Option<Severity> {
        match self {
            DurationClass::Normal => None,
            DurationClass::Warning => Some(Severity::Warning),
            DurationClass::Error => Some(Severity::Error),
        }
    }
}

/// One observation emitted by a session tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub severity: Severity,
    /// Base name of the log file the record came from
    pub source_file: String,
    pub message: String,
    /// 1-based line number, set for parse errors and protocol violations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
}

impl DiagnosticRecord {
    pub fn info(source_file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, source_file, message)
    }

    pub fn warning(source_file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, source_file, message)
    }

    pub fn error(source_file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, source_file, message)
    }

    pub fn new(
        severity: Severity,
        source_file: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            source_file: source_file.into(),
            message: message.into(),
            line_number: None,
        }
    }

    /// Attach a 1-based line number
    pub fn at_line(mut self, line_number: usize) -> Self {
        self.line_number = Some(line_number);
        self
    }

    /// Message with the line number folded in, as written by sinks
    pub fn rendered_message(&self) -> String {
        match self.line_number {
            Some(line) => format!("line {line} - {}", self.message),
            None => self.message.clone(),
        }
    }
}

impl fmt::Display for DiagnosticRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{};{}",
            self.source_file,
            self.severity,
            self.rendered_message()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parse_trims_whitespace() {
        assert_eq!(Action::parse(" START"), Action::Start);
        assert_eq!(Action::parse("END \t"), Action::End);
        assert_eq!(Action::parse("start"), Action::Invalid("start".to_string()));
    }

    #[test]
    fn test_duration_class_boundaries() {
        assert_eq!(DurationClass::classify(0), DurationClass::Normal);
        assert_eq!(DurationClass::classify(MIN5 - 1), DurationClass::Normal);
        assert_eq!(DurationClass::classify(MIN5), DurationClass::Warning);
        assert_eq!(DurationClass::classify(MIN10 - 1), DurationClass::Warning);
        assert_eq!(DurationClass::classify(MIN10), DurationClass::Error);
        assert_eq!(DurationClass::Normal.severity(), None);
    }

    #[test]
    fn test_record_rendering() {
        let record = DiagnosticRecord::info("logs-1.log", "Action not START or END").at_line(3);
        assert_eq!(record.rendered_message(), "line 3 - Action not START or END");
        assert_eq!(
            record.to_string(),
            "logs-1.log;INFO;line 3 - Action not START or END"
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["severity"], "info");
        assert_eq!(json["line_number"], 3);
    }
}
