//! Session Tracker
//!
//! Single-pass state machine over the lines of one log file. Each PID is
//! either absent or open; a START opens it, the matching END closes it and
//! classifies the elapsed time. Anything the tracker cannot make sense of
//! becomes one info-level [`DiagnosticRecord`] and the next line is
//! processed as usual.

use crate::error::LineError;
use crate::parser::parse_line;
use crate::sink::DiagnosticSink;
use crate::types::{Action, DiagnosticRecord, DurationClass, LogLine, Severity};
use chrono::NaiveTime;
use std::collections::HashMap;
use tracing::{debug, trace};

/// A session that has seen START but not yet END
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSession {
    pub start: NaiveTime,
    pub description: String,
    pub last_action: Action,
    /// Line that opened (or last reopened) the session
    pub line_number: usize,
}

/// Tracks live sessions for one file
#[derive(Debug)]
pub struct SessionTracker {
    source_file: String,
    sessions: HashMap<String, OpenSession>,
    lines_processed: usize,
}

impl SessionTracker {
    /// Create a tracker whose records are attributed to `source_file`
    pub fn new(source_file: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            sessions: HashMap::new(),
            lines_processed: 0,
        }
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn lines_processed(&self) -> usize {
        self.lines_processed
    }

    /// Parse and apply one raw line.
    pub fn process_line(&mut self, line_number: usize, raw: &str) -> Option<DiagnosticRecord> {
        match parse_line(raw) {
            Ok(line) => self.process_event(line_number, line),
            Err(e) => {
                self.lines_processed += 1;
                Some(self.line_error(line_number, e))
            }
        }
    }

    /// Apply one already-parsed line.
    pub fn process_event(&mut self, line_number: usize, line: LogLine) -> Option<DiagnosticRecord> {
        self.lines_processed += 1;
        match self.apply(line_number, line) {
            Ok(record) => record,
            Err(e) => Some(self.line_error(line_number, e)),
        }
    }

    fn apply(
        &mut self,
        line_number: usize,
        line: LogLine,
    ) -> Result<Option<DiagnosticRecord>, LineError> {
        let LogLine {
            timestamp,
            description,
            action,
            pid,
        } = line;

        match action {
            Action::Start => {
                let session = OpenSession {
                    start: timestamp,
                    description,
                    last_action: Action::Start,
                    line_number,
                };
                // Overwrite first so a later END measures from this START.
                if self.sessions.insert(pid.clone(), session).is_some() {
                    return Err(LineError::DuplicateStart { pid });
                }
                trace!(pid = %pid, line = line_number, "Session opened");
                Ok(None)
            }
            Action::End => {
                let session = self
                    .sessions
                    .remove(&pid)
                    .ok_or_else(|| LineError::EndWithoutStart { pid: pid.clone() })?;

                let seconds = (timestamp - session.start).num_seconds();
                if seconds < 0 {
                    return Err(LineError::EndBeforeStart {
                        pid,
                        start: session.start.to_string(),
                        end: timestamp.to_string(),
                    });
                }

                let class = DurationClass::classify(seconds);
                debug!(pid = %pid, seconds, class = ?class, "Session closed");
                Ok(class
                    .severity()
                    .map(|severity| self.duration_record(severity, &pid)))
            }
            Action::Invalid(action) => Err(LineError::InvalidAction { action }),
        }
    }

    fn duration_record(&self, severity: Severity, pid: &str) -> DiagnosticRecord {
        let minutes = if severity == Severity::Error { 10 } else { 5 };
        DiagnosticRecord::new(
            severity,
            self.source_file.clone(),
            format!("Job with PID - {pid} took longer than {minutes} minutes"),
        )
    }

    fn line_error(&self, line_number: usize, error: LineError) -> DiagnosticRecord {
        debug!(
            file = %self.source_file,
            line = line_number,
            parse_error = error.is_parse_error(),
            error = %error,
            "Recovered from line error"
        );
        DiagnosticRecord::info(self.source_file.clone(), error.to_string()).at_line(line_number)
    }

    /// Whether `pid` currently has an open session
    pub fn is_open(&self, pid: &str) -> bool {
        self.sessions.contains_key(pid)
    }

    pub fn open_session(&self, pid: &str) -> Option<&OpenSession> {
        self.sessions.get(pid)
    }

    /// Number of sessions still open
    pub fn open_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// End-of-input sweep: one record per session still open, in the order
    /// the sessions were opened.
    pub fn finish(self) -> Vec<DiagnosticRecord> {
        let mut remaining: Vec<(String, OpenSession)> = self.sessions.into_iter().collect();
        remaining.sort_by_key(|(_, session)| session.line_number);

        remaining
            .into_iter()
            .map(|(pid, session)| {
                let message = match session.last_action {
                    Action::Start => format!("PID: {pid} - still running"),
                    _ => format!("PID: {pid} - unknown state"),
                };
                DiagnosticRecord::info(self.source_file.clone(), message)
            })
            .collect()
    }
}

/// Run a whole in-memory line sequence through a fresh tracker, emitting
/// every record to `sink` in line order followed by the end-of-input sweep.
///
/// Returns the number of records emitted.
pub fn track_lines<'a, I>(source_file: &str, lines: I, sink: &dyn DiagnosticSink) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tracker = SessionTracker::new(source_file);
    let mut emitted = 0;
    for (index, raw) in lines.into_iter().enumerate() {
        if let Some(record) = tracker.process_line(index + 1, raw) {
            sink.emit(&record);
            emitted += 1;
        }
    }
    for record in tracker.finish() {
        sink.emit(&record);
        emitted += 1;
    }
    emitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use rstest::rstest;

    fn run(input: &str) -> Vec<DiagnosticRecord> {
        let sink = MemorySink::new();
        track_lines("logs-1.log", input.lines(), &sink);
        sink.records()
    }

    #[rstest]
    #[case("10:04:00", None)]
    #[case("10:04:59", None)]
    #[case("10:05:00", Some(Severity::Warning))]
    #[case("10:07:00", Some(Severity::Warning))]
    #[case("10:09:59", Some(Severity::Warning))]
    #[case("10:10:00", Some(Severity::Error))]
    #[case("10:11:00", Some(Severity::Error))]
    fn test_duration_classification(#[case] end: &str, #[case] expected: Option<Severity>) {
        let input = format!("10:00:00,job A,START,1\n{end},job A,END,1");
        let records = run(&input);
        match expected {
            None => assert!(records.is_empty(), "unexpected records: {records:?}"),
            Some(severity) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].severity, severity);
                assert!(records[0].message.contains("PID - 1"));
                assert_eq!(records[0].line_number, None);
            }
        }
    }

    #[test]
    fn test_warning_and_error_messages() {
        let records = run(
            "10:00:00,a,START,1\n10:00:00,b,START,2\n10:07:00,a,END,1\n10:11:00,b,END,2",
        );
        assert_eq!(
            records[0].message,
            "Job with PID - 1 took longer than 5 minutes"
        );
        assert_eq!(
            records[1].message,
            "Job with PID - 2 took longer than 10 minutes"
        );
    }

    #[test]
    fn test_duplicate_start_overwrites() {
        let mut tracker = SessionTracker::new("logs-1.log");
        assert!(tracker.process_line(1, "10:00:00,first,START,7").is_none());

        let record = tracker.process_line(2, "10:08:00,second,START,7").unwrap();
        assert_eq!(record.severity, Severity::Info);
        assert_eq!(record.line_number, Some(2));
        assert!(record.message.contains("7"));

        let session = tracker.open_session("7").unwrap();
        assert_eq!(session.description, "second");
        assert_eq!(session.start, NaiveTime::from_hms_opt(10, 8, 0).unwrap());

        // Measured from the second START: 4 minutes, nothing to report.
        assert!(tracker.process_line(3, "10:12:00,second,END,7").is_none());
        assert!(!tracker.is_open("7"));
        assert!(tracker.finish().is_empty());
    }

    #[test]
    fn test_end_without_start_leaves_state_untouched() {
        let mut tracker = SessionTracker::new("logs-1.log");
        tracker.process_line(1, "10:00:00,a,START,1");

        let record = tracker.process_line(2, "10:01:00,b,END,2").unwrap();
        assert_eq!(record.message, "PID ended, but never started - 2");
        assert_eq!(record.line_number, Some(2));
        assert_eq!(tracker.open_sessions(), 1);
        assert!(tracker.is_open("1"));
    }

    #[test]
    fn test_invalid_action_leaves_state_untouched() {
        let mut tracker = SessionTracker::new("logs-1.log");
        tracker.process_line(1, "10:00:00,a,START,1");

        let record = tracker.process_line(2, "10:01:00,a, PAUSE ,1").unwrap();
        assert_eq!(record.message, "Action not START or END");
        assert_eq!(tracker.open_sessions(), 1);
        assert_eq!(
            tracker.open_session("1").unwrap().start,
            NaiveTime::from_hms_opt(10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_error_does_not_stop_processing() {
        let records = run("garbage\n10:00:00,a,START,1\n10:11:00,a,END,1");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].severity, Severity::Info);
        assert_eq!(records[0].line_number, Some(1));
        assert!(records[0].message.contains("found 1"));
        assert_eq!(records[1].severity, Severity::Error);
    }

    #[test]
    fn test_whitespace_around_action_is_trimmed() {
        let records = run("10:00:00,a, START ,1\n10:07:00,a,\tEND,1");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].severity, Severity::Warning);
    }

    #[test]
    fn test_end_before_start_is_reported_and_closes() {
        let mut tracker = SessionTracker::new("logs-1.log");
        tracker.process_line(1, "23:58:00,nightly,START,9");
        let record = tracker.process_line(2, "00:03:00,nightly,END,9").unwrap();
        assert_eq!(record.severity, Severity::Info);
        assert_eq!(record.line_number, Some(2));
        assert!(record.message.contains("midnight"));
        assert!(!tracker.is_open("9"));
    }

    #[test]
    fn test_lone_start_is_still_running() {
        let records = run("10:00:00,job A,START,1");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "PID: 1 - still running");
        assert_eq!(records[0].source_file, "logs-1.log");
        assert_eq!(records[0].line_number, None);
    }

    #[test]
    fn test_sweep_reports_each_pid_once_in_open_order() {
        let records = run(
            "10:00:00,c,START,30\n10:00:01,a,START,10\n10:00:02,b,START,20\n10:00:03,a,START,10",
        );
        // One duplicate notice, then one sweep record per open PID.
        assert_eq!(records.len(), 4);
        let sweep: Vec<&str> = records[1..].iter().map(|r| r.message.as_str()).collect();
        assert_eq!(
            sweep,
            vec![
                "PID: 30 - still running",
                "PID: 20 - still running",
                "PID: 10 - still running",
            ]
        );
    }

    #[test]
    fn test_records_preserve_line_order() {
        let records = run(
            "bad\n10:00:00,a,END,1\n10:00:00,a,START,2\n10:00:00,a,START,2\n10:00:00,a,NOPE,2",
        );
        let lines: Vec<Option<usize>> = records.iter().map(|r| r.line_number).collect();
        assert_eq!(lines, vec![Some(1), Some(2), Some(4), Some(5), None]);
    }

    #[test]
    fn test_lines_processed_counts_every_line() {
        let mut tracker = SessionTracker::new("logs-1.log");
        tracker.process_line(1, "bad");
        tracker.process_line(2, "10:00:00,a,START,1");
        assert_eq!(tracker.lines_processed(), 2);
    }
}
