//! Line parser for `HH:MM:SS,<description>,<START|END>,<pid>` records.

use crate::error::LineError;
use crate::types::{Action, LogLine};
use chrono::NaiveTime;

/// Time-of-day format of the first column
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

const FIELD_COUNT: usize = 4;

/// Strip one trailing `\n`, `\r\n` or bare `\r`.
pub fn strip_line_ending(raw: &str) -> &str {
    let line = raw.strip_suffix('\n').unwrap_or(raw);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Parse one raw line into a [`LogLine`].
///
/// The description is kept verbatim. Only the action is trimmed; the PID
/// is an opaque identifier and is compared exactly as written.
pub fn parse_line(raw: &str) -> Result<LogLine, LineError> {
    let line = strip_line_ending(raw);
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != FIELD_COUNT {
        return Err(LineError::FieldCount {
            found: fields.len(),
        });
    }

    let timestamp = parse_timestamp(fields[0])?;

    Ok(LogLine {
        timestamp,
        description: fields[1].to_string(),
        action: Action::parse(fields[2]),
        pid: fields[3].to_string(),
    })
}

/// Parse a `HH:MM:SS` time of day.
pub fn parse_timestamp(value: &str) -> Result<NaiveTime, LineError> {
    NaiveTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| LineError::InvalidTimestamp {
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_well_formed_line() {
        let line = parse_line("10:00:00,scheduled task 051, START,39547\n").unwrap();
        assert_eq!(line.timestamp, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(line.description, "scheduled task 051");
        assert_eq!(line.action, Action::Start);
        assert_eq!(line.pid, "39547");
    }

    #[rstest]
    #[case("10:00:00,job,END,1", "10:00:00,job,END,1")]
    #[case("10:00:00,job,END,1\n", "10:00:00,job,END,1")]
    #[case("10:00:00,job,END,1\r\n", "10:00:00,job,END,1")]
    #[case("10:00:00,job,END,1\r", "10:00:00,job,END,1")]
    fn test_strip_line_ending(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(strip_line_ending(raw), expected);
    }

    #[test]
    fn test_crlf_line_keeps_pid_clean() {
        let line = parse_line("10:00:00,job,END,42\r\n").unwrap();
        assert_eq!(line.pid, "42");
        assert_eq!(line.action, Action::End);
    }

    #[rstest]
    #[case("", 1)]
    #[case("10:00:00,job,START", 3)]
    #[case("10:00:00,job, with comma,START,1", 5)]
    fn test_wrong_field_count(#[case] raw: &str, #[case] found: usize) {
        assert_eq!(parse_line(raw), Err(LineError::FieldCount { found }));
    }

    #[rstest]
    #[case("25:00:00")]
    #[case("10:00")]
    #[case("ten o'clock")]
    fn test_invalid_timestamp(#[case] timestamp: &str) {
        let raw = format!("{timestamp},job,START,1");
        assert_eq!(
            parse_line(&raw),
            Err(LineError::InvalidTimestamp {
                value: timestamp.to_string()
            })
        );
    }

    #[test]
    fn test_invalid_action_is_not_a_parse_error() {
        let line = parse_line("10:00:00,job,PAUSE,1").unwrap();
        assert_eq!(line.action, Action::Invalid("PAUSE".to_string()));
    }
}
