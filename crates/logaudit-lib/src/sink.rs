//! Diagnostic sinks
//!
//! Trackers hand every record to a [`DiagnosticSink`]. Sinks are shared
//! between file workers, so each one serializes its own writes; nothing
//! else in the pipeline is shared.

use crate::types::{DiagnosticRecord, Severity};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info, warn};

/// Timestamp format of the file sink
pub const SINK_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Consumer of diagnostic records
pub trait DiagnosticSink: Send + Sync {
    /// Record one observation. Must not reorder records from one caller.
    fn emit(&self, record: &DiagnosticRecord);

    /// Push buffered records to their destination
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Arc<S> {
    fn emit(&self, record: &DiagnosticRecord) {
        (**self).emit(record)
    }

    fn flush(&self) -> io::Result<()> {
        (**self).flush()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Collects records in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<DiagnosticRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far
    pub fn records(&self) -> Vec<DiagnosticRecord> {
        lock(&self.records).clone()
    }

    /// Records attributed to one source file, in emission order
    pub fn records_for(&self, source_file: &str) -> Vec<DiagnosticRecord> {
        lock(&self.records)
            .iter()
            .filter(|record| record.source_file == source_file)
            .cloned()
            .collect()
    }

    pub fn count(&self, severity: Severity) -> usize {
        lock(&self.records)
            .iter()
            .filter(|record| record.severity == severity)
            .count()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, record: &DiagnosticRecord) {
        lock(&self.records).push(record.clone());
    }
}

/// Appends `timestamp;logfile;level;message` lines to a file
pub struct FileSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    /// First write failure since the last flush
    write_error: Mutex<Option<io::Error>>,
}

impl FileSink {
    /// Open (or create) the output file in append mode
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        info!(output = %path.display(), "Opened diagnostic output file");

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
            write_error: Mutex::new(None),
        })
    }

    /// Render one record as an output line (without the newline)
    pub fn format_record(record: &DiagnosticRecord) -> String {
        format!(
            "{};{};{};{}",
            Local::now().format(SINK_TIMESTAMP_FORMAT),
            record.source_file,
            record.severity.as_level(),
            record.rendered_message()
        )
    }
}

impl DiagnosticSink for FileSink {
    fn emit(&self, record: &DiagnosticRecord) {
        let line = Self::format_record(record);
        let mut writer = lock(&self.writer);
        if let Err(e) = writeln!(writer, "{line}") {
            error!(output = %self.path.display(), error = %e, "Failed to write diagnostic record");
            let mut write_error = lock(&self.write_error);
            if write_error.is_none() {
                *write_error = Some(e);
            }
        }
    }

    /// Fails if any record since the last flush could not be written.
    fn flush(&self) -> io::Result<()> {
        let flushed = lock(&self.writer).flush();
        match lock(&self.write_error).take() {
            Some(e) => Err(e),
            None => flushed,
        }
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if let Err(e) = lock(&self.writer).flush() {
            warn!(output = %self.path.display(), error = %e, "Failed to flush diagnostic output");
        }
    }
}

/// Forwards records to `tracing` at the matching level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, record: &DiagnosticRecord) {
        let logfile = record.source_file.as_str();
        let line = record.line_number;
        match record.severity {
            Severity::Info => info!(logfile, line, "{}", record.message),
            Severity::Warning => warn!(logfile, line, "{}", record.message),
            Severity::Error => error!(logfile, line, "{}", record.message),
        }
    }
}

/// Forwards each record to every inner sink, in order
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn DiagnosticSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl DiagnosticSink for FanoutSink {
    fn emit(&self, record: &DiagnosticRecord) {
        for sink in &self.sinks {
            sink.emit(record);
        }
    }

    fn flush(&self) -> io::Result<()> {
        for sink in &self.sinks {
            sink.flush()?;
        }
        Ok(())
    }
}
