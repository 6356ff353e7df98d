//! Debug logging for hooks.
//!
//! Appends timestamped lines to a plain-text log. Hooks must never fail
//! because of diagnostics, so [`DebugLog::log`] discards every error.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{Local, NaiveDateTime};
use std::fs::{self, OpenOptions};
use std::io::Write;

/// Best-effort diagnostics file.
#[derive(Debug, Clone)]
pub struct DebugLog {
    path: Utf8PathBuf,
}

impl DebugLog {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Append `message` as one `[YYYY-MM-DD HH:MM:SS] message` line.
    ///
    /// Failures (permissions, full disk, bad path) are a no-op.
    pub fn log(&self, message: &str) {
        let _ = self.try_log(message);
    }

    /// Fallible variant of [`DebugLog::log`].
    pub fn try_log(&self, message: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let stamp = format_timestamp(Local::now().naive_local());
        writeln!(file, "[{}] {}", stamp, message)?;

        Ok(())
    }
}

/// Format a local timestamp the way log lines carry it.
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}
