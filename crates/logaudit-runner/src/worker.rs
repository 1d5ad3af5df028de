//! One worker per log file
//!
//! A worker owns a private [`SessionTracker`], reads its file line by line
//! and forwards each record to the shared sink as soon as it is produced.
//! Per-line problems never stop a worker; only failing to open or read the
//! file does, and that failure stays confined to this file's report.

use logaudit_lib::{
    AuditError, AuditResult, DiagnosticRecord, DiagnosticSink, SessionTracker, Severity,
};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tracing::{debug, error, info, instrument, warn};

/// A validated log file path
#[derive(Debug, Clone)]
pub struct LogFileSource {
    path: PathBuf,
    name: String,
}

impl LogFileSource {
    /// Fails with [`AuditError::FileNotFound`] unless `path` is a regular file.
    pub fn new(path: impl Into<PathBuf>) -> AuditResult<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(AuditError::FileNotFound(path));
        }
        let name = source_name(&path);
        Ok(Self { path, name })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base name used as `logfile` in diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// How a worker ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Whole file read and swept for open sessions
    Completed,
    /// Stopped by shutdown before the end of the file
    Cancelled,
    /// File could not be opened or read
    Failed { error: String },
}

/// Result of scanning one file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub source_file: String,
    #[serde(flatten)]
    pub outcome: FileOutcome,
    pub lines_read: usize,
    pub info: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl FileReport {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            source_file: source_name(path),
            outcome: FileOutcome::Completed,
            lines_read: 0,
            info: 0,
            warnings: 0,
            errors: 0,
        }
    }

    /// Report for a worker that never produced one of its own
    pub fn failed(path: &Path, error: impl Into<String>) -> Self {
        Self {
            outcome: FileOutcome::Failed {
                error: error.into(),
            },
            ..Self::new(path)
        }
    }

    fn record(&mut self, record: &DiagnosticRecord) {
        match record.severity {
            Severity::Info => self.info += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Error => self.errors += 1,
        }
    }

    pub fn diagnostics(&self) -> usize {
        self.info + self.warnings + self.errors
    }
}

/// Scan one file, stopping early if `shutdown` fires.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn scan_file(
    path: PathBuf,
    sink: Arc<dyn DiagnosticSink>,
    shutdown: oneshot::Receiver<()>,
) -> FileReport {
    let mut report = FileReport::new(&path);

    if let Err(e) = scan_into(&path, sink.as_ref(), shutdown, &mut report).await {
        error!(error = %e, "Failed to scan log file");
        report.outcome = FileOutcome::Failed {
            error: e.to_string(),
        };
    }

    if let Err(e) = sink.flush() {
        warn!(error = %e, "Failed to flush diagnostics");
        report.outcome = FileOutcome::Failed {
            error: format!("diagnostics were not written: {e}"),
        };
    }

    info!(
        outcome = ?report.outcome,
        lines = report.lines_read,
        warnings = report.warnings,
        errors = report.errors,
        "Finished log file"
    );
    report
}

async fn scan_into(
    path: &Path,
    sink: &dyn DiagnosticSink,
    shutdown: oneshot::Receiver<()>,
    report: &mut FileReport,
) -> AuditResult<()> {
    let source = LogFileSource::new(path)?;
    let file = File::open(source.path())
        .await
        .map_err(|e| AuditError::io(source.path(), e))?;

    let tracker = SessionTracker::new(source.name());
    scan_lines(BufReader::new(file), tracker, sink, shutdown, report)
        .await
        .map_err(|e| AuditError::io(source.path(), e))
}

/// Feed `reader` to `tracker` line by line until EOF or shutdown.
///
/// A line cut short by the shutdown branch winning a race stays in `buf`
/// and the next read completes it.
async fn scan_lines<R>(
    mut reader: R,
    mut tracker: SessionTracker,
    sink: &dyn DiagnosticSink,
    mut shutdown: oneshot::Receiver<()>,
    report: &mut FileReport,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    // Stays armed until the signal fires or its sender goes away.
    let mut shutdown_armed = true;

    loop {
        let read = tokio::select! {
            biased;
            signal = &mut shutdown, if shutdown_armed => {
                if signal.is_ok() {
                    report.outcome = FileOutcome::Cancelled;
                    debug!(lines = report.lines_read, "Shutdown requested, stopping");
                    return Ok(());
                }
                shutdown_armed = false;
                continue;
            }
            read = reader.read_until(b'\n', &mut buf) => read,
        };

        if read? == 0 && buf.is_empty() {
            break;
        }

        let line_number = tracker.lines_processed() + 1;
        let line = String::from_utf8_lossy(&buf);
        let record = tracker.process_line(line_number, &line);
        report.lines_read = tracker.lines_processed();
        if let Some(record) = record {
            report.record(&record);
            sink.emit(&record);
        }
        buf.clear();
    }

    for record in tracker.finish() {
        report.record(&record);
        sink.emit(&record);
    }
    Ok(())
}
