use anyhow::{Context, Result};
use logaudit_lib::DiagnosticSink;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub mod config;
pub mod discovery;
pub mod error;
pub mod renderer;
pub mod shutdown;
pub mod worker;

pub use config::AuditConfig;
pub use error::RunnerError;
pub use shutdown::ShutdownCoordinator;
pub use worker::{FileOutcome, FileReport, LogFileSource, scan_file};

/// Outcome of a whole audit run, one report per discovered file
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub logs_dir: PathBuf,
    pub files: Vec<FileReport>,
}

impl RunSummary {
    /// Files whose worker failed to open or read them
    pub fn failed(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|report| matches!(report.outcome, FileOutcome::Failed { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    pub fn cancelled_count(&self) -> usize {
        self.files
            .iter()
            .filter(|report| report.outcome == FileOutcome::Cancelled)
            .count()
    }

    pub fn total_warnings(&self) -> usize {
        self.files.iter().map(|report| report.warnings).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.files.iter().map(|report| report.errors).sum()
    }

    pub fn total_info(&self) -> usize {
        self.files.iter().map(|report| report.info).sum()
    }
}

/// Scans every log file found under `config.logs_dir` concurrently.
///
/// Each file gets its own tokio task and its own tracker; records go to
/// `sink` as they are produced. A file that cannot be read shows up as a
/// failed report and does not affect the others.
#[instrument(skip_all, fields(logs_dir = %config.logs_dir.display()))]
pub async fn run_audit(
    config: &AuditConfig,
    sink: Arc<dyn DiagnosticSink>,
    shutdown: &ShutdownCoordinator,
) -> Result<RunSummary> {
    config.validate().context("Invalid audit configuration")?;
    let pattern = discovery::compile_pattern(&config.file_pattern)?;
    let log_paths = discovery::discover_log_files(&config.logs_dir, &pattern)?;

    let mut summary = RunSummary {
        logs_dir: config.logs_dir.clone(),
        files: Vec::with_capacity(log_paths.len()),
    };
    if log_paths.is_empty() {
        return Ok(summary);
    }

    info!(files = log_paths.len(), "Starting file workers");

    let mut handles = Vec::with_capacity(log_paths.len());
    for path in log_paths {
        let signal = shutdown.create_shutdown_signal().await;
        let handle = tokio::spawn(scan_file(path.clone(), sink.clone(), signal));
        handles.push((path, handle));
    }

    for (path, handle) in handles {
        let report = match handle.await {
            Ok(report) => report,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "File worker did not complete");
                FileReport::failed(&path, format!("worker aborted: {e}"))
            }
        };
        summary.files.push(report);
    }

    sink.flush().context("Failed to flush diagnostics")?;

    info!(
        files = summary.files.len(),
        failed = summary.failed_count(),
        cancelled = summary.cancelled_count(),
        warnings = summary.total_warnings(),
        errors = summary.total_errors(),
        "Audit run finished"
    );
    Ok(summary)
}
