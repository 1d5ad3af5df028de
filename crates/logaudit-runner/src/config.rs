//! Configuration for an audit run

use crate::error::RunnerError;
use std::path::PathBuf;

/// Base-name pattern of the log files picked up from the logs directory
pub const DEFAULT_FILE_PATTERN: &str = r"^logs-[0-9]+\.log$";

/// Configuration for one audit run
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Directory scanned for log files (not recursive)
    pub logs_dir: PathBuf,

    /// File the diagnostic records are appended to
    pub output_path: PathBuf,

    /// Case-insensitive regex matched against each file's base name
    pub file_pattern: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            logs_dir: cwd.join("logs"),
            output_path: cwd.join("output"),
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
        }
    }
}

impl AuditConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("LOGAUDIT_LOGS_DIR") {
            config.logs_dir = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("LOGAUDIT_OUTPUT") {
            config.output_path = PathBuf::from(path);
        }

        if let Ok(pattern) = std::env::var("LOGAUDIT_FILE_PATTERN") {
            config.file_pattern = pattern;
        }

        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), RunnerError> {
        if self.logs_dir.as_os_str().is_empty() {
            return Err(RunnerError::config("logs_dir cannot be empty"));
        }

        if !self.logs_dir.is_dir() {
            return Err(RunnerError::LogsDirNotFound {
                path: self.logs_dir.display().to_string(),
            });
        }

        if self.output_path.as_os_str().is_empty() {
            return Err(RunnerError::config("output_path cannot be empty"));
        }

        if self.output_path.is_dir() {
            return Err(RunnerError::config(format!(
                "output_path {} is a directory",
                self.output_path.display()
            )));
        }

        if self.file_pattern.is_empty() {
            return Err(RunnerError::config("file_pattern cannot be empty"));
        }

        Ok(())
    }
}
