/// Errors raised before any log file is scanned
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Logs directory not found: {path}")]
    LogsDirNotFound { path: String },

    #[error("Invalid file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

impl RunnerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}
