//! Log file discovery

use crate::error::RunnerError;
use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Compile a case-insensitive base-name pattern
pub fn compile_pattern(pattern: &str) -> Result<Regex, RunnerError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| RunnerError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Whether a path's base name matches `pattern`
pub fn is_log_file(path: &Path, pattern: &Regex) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| pattern.is_match(name))
}

/// Files directly inside `dir` whose base name matches `pattern`, sorted.
///
/// Subdirectories are not descended into. Entries that are not regular
/// files are skipped even when their names match.
pub fn discover_log_files(dir: &Path, pattern: &Regex) -> Result<Vec<PathBuf>> {
    let mut log_paths = vec![];
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read logs directory: {}", dir.display()))?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !is_log_file(&path, pattern) {
            debug!(path = %path.display(), "Ignoring file not matching log pattern");
            continue;
        }
        if path.is_file() {
            log_paths.push(path);
        }
    }

    if log_paths.is_empty() {
        info!(dir = %dir.display(), "No log files found to scan.");
    }

    log_paths.sort();
    Ok(log_paths)
}
